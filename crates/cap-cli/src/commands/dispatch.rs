use crate::cli::GlobalFlags;
use crate::cli::root_commands::Commands;
use crate::commands;
use crate::context::AppContext;

/// Dispatch a parsed command to the corresponding handler module.
pub async fn dispatch(command: Commands, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    match command {
        Commands::Project { action } => commands::project::handle(&action, ctx, flags).await,
        Commands::Investor { action } => commands::investor::handle(&action, ctx, flags).await,
        Commands::Subscription { action } => {
            commands::subscription::handle(&action, ctx, flags).await
        }
        Commands::Allocation { action } => commands::allocation::handle(&action, ctx, flags).await,
        Commands::Wallet { action } => commands::wallet::handle(&action, ctx, flags).await,
        Commands::Activity { action } => commands::activity::handle(&action, ctx, flags).await,
        Commands::Schema(args) => commands::schema::handle(&args, flags),
    }
}
