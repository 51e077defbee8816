//! Command implementations.

pub mod cart;

use rocketshoes_cart::CartConfig;

use crate::Commands;

/// Run a parsed command against the configured cart store.
///
/// # Errors
///
/// Returns an error if the store cannot be built or the cart operation fails.
pub async fn run(command: Commands, config: &CartConfig) -> Result<(), cart::CommandError> {
    let session = cart::Session::open(config)?;

    let result = match command {
        Commands::Show => Ok(()),
        Commands::Add { id } => session.store.add_one(id).await.map_err(Into::into),
        Commands::Remove { id } => session.store.remove_one(id).await.map_err(Into::into),
        Commands::Set { id, amount } => session
            .store
            .set_amount(id, amount)
            .await
            .map(|_| ())
            .map_err(Into::into),
    };

    session.flush_notices();
    session.print_cart();
    result
}
