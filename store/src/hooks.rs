use sweeper_core::GameId;

use crate::*;

/// Runs after a game has been created and saved.
///
/// The boundary layer invokes hooks itself; the engine and the service never
/// call them.
pub trait PostCreateHook {
    fn on_created(&self, id: GameId) -> ServiceResult<()>;
}

impl<F> PostCreateHook for F
where
    F: Fn(GameId) -> ServiceResult<()>,
{
    fn on_created(&self, id: GameId) -> ServiceResult<()> {
        self(id)
    }
}

/// Records the signed-in user as owner of a newly created game.
pub struct AssociateOwner<'a> {
    owners: &'a dyn OwnerStore,
    owner: String,
}

impl<'a> AssociateOwner<'a> {
    pub fn new(owners: &'a dyn OwnerStore, owner: impl Into<String>) -> Self {
        Self {
            owners,
            owner: owner.into(),
        }
    }
}

impl PostCreateHook for AssociateOwner<'_> {
    fn on_created(&self, id: GameId) -> ServiceResult<()> {
        log::debug!("Associating game {id} with {}", self.owner);
        self.owners.add_mapping(&self.owner, id)?;
        Ok(())
    }
}

/// Runs each hook in order, stopping at the first failure.
pub fn run_post_create_hooks(id: GameId, hooks: &[&dyn PostCreateHook]) -> ServiceResult<()> {
    for hook in hooks {
        hook.on_created(id)?;
    }
    Ok(())
}
