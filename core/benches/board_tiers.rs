use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use sweeper_core::*;

const TIERS: [(Coord, Coord, CellCount); 4] = [
    (9, 9, 10),
    (16, 16, 40),
    (30, 16, 99),
    (255, 255, 1000),
];

fn bench_generate(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate");
    for (width, height, mines) in TIERS {
        let config = GameConfig::new((width, height), mines).unwrap();
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{width}x{height}/{mines}")),
            &config,
            |b, &config| {
                let mut generator = RandomBoardGenerator::from_seed(42);
                b.iter(|| black_box(generator.generate(config).unwrap()))
            },
        );
    }
    group.finish();
}

fn bench_flood_fill(c: &mut Criterion) {
    let mut group = c.benchmark_group("zero_flood_fill");
    for (width, height, _) in TIERS {
        // One mine in the corner leaves a single zero region covering the board.
        let board = Board::from_mine_coords((width, height), &[(0, 0)]).unwrap();
        let start = (width - 1, height - 1);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{width}x{height}")),
            &board,
            |b, board| b.iter(|| black_box(zero_flood_fill(board, start).unwrap())),
        );
    }
    group.finish();
}

fn bench_codec(c: &mut Criterion) {
    let (board, mines) = RandomBoardGenerator::from_seed(7)
        .generate(GameConfig::new((255, 255), 1000).unwrap())
        .unwrap();
    let created_at = chrono::DateTime::from_timestamp(1_700_000_000, 0).unwrap();
    let game = Game::new(GameId(1), board, mines, created_at).unwrap();
    let bytes = encode(&game).unwrap();

    c.bench_function("codec/encode_255x255", |b| {
        b.iter(|| black_box(encode(&game).unwrap()))
    });
    c.bench_function("codec/decode_255x255", |b| {
        b.iter(|| black_box(decode(GameId(1), &bytes).unwrap()))
    });
}

criterion_group!(board_tiers, bench_generate, bench_flood_fill, bench_codec);
criterion_main!(board_tiers);
