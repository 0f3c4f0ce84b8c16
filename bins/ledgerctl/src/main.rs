//! Operator CLI for Coopledger ledgers.
//!
//! Reads configuration the same way the services do (`config/*.toml`, then
//! `COOPLEDGER__*` environment variables) and prints JSON to stdout.
//!
//! Usage:
//!   ledgerctl daily-balances --org <ID> --branch <ID> --account <ID> [--member <ID>] --from <DATE> --to <DATE>
//!   ledgerctl effective-account --account <ID> [--as-of <RFC3339>]
//!   ledgerctl generate-interest --batch <ID>
//!   ledgerctl verify-summary --org <ID> --branch <ID> --member <ID> --account <ID>

use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use coopledger_core::ledger::PostingScope;
use coopledger_core::member_ledger::SummaryKey;
use coopledger_db::LedgerServices;
use coopledger_shared::types::{
    AccountId, BranchId, InterestBatchId, MemberProfileId, OrganizationId,
};
use coopledger_shared::{AppConfig, AppError, logging};
use sea_orm::TransactionTrait;
use serde_json::json;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "ledgerctl", version, about = "Inspect and maintain Coopledger ledgers")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the daily closing balances of a scope and their statistics.
    DailyBalances {
        /// Organization.
        #[arg(long)]
        org: OrganizationId,
        /// Branch.
        #[arg(long)]
        branch: BranchId,
        /// Account.
        #[arg(long)]
        account: AccountId,
        /// Member, for member-tracked accounts.
        #[arg(long)]
        member: Option<MemberProfileId>,
        /// First day, YYYY-MM-DD.
        #[arg(long)]
        from: NaiveDate,
        /// Last day, YYYY-MM-DD.
        #[arg(long)]
        to: NaiveDate,
    },
    /// Print the account terms in force at an instant.
    EffectiveAccount {
        /// Account.
        #[arg(long)]
        account: AccountId,
        /// Instant, RFC 3339. Defaults to now.
        #[arg(long)]
        as_of: Option<DateTime<Utc>>,
    },
    /// Compute the entries of an interest batch and commit them.
    GenerateInterest {
        /// Batch.
        #[arg(long)]
        batch: InterestBatchId,
    },
    /// Compare a member summary with the ledger.
    VerifySummary {
        /// Organization.
        #[arg(long)]
        org: OrganizationId,
        /// Branch.
        #[arg(long)]
        branch: BranchId,
        /// Member.
        #[arg(long)]
        member: MemberProfileId,
        /// Account.
        #[arg(long)]
        account: AccountId,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = AppConfig::load().context("failed to load configuration")?;
    logging::init(&config.logging).context("failed to install tracing subscriber")?;

    let services = LedgerServices::connect(&config)
        .await
        .context("failed to connect to database")?;

    let output = run(&services, cli.command).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn run(services: &LedgerServices, command: Command) -> anyhow::Result<serde_json::Value> {
    match command {
        Command::DailyBalances {
            org,
            branch,
            account,
            member,
            from,
            to,
        } => {
            let scope = PostingScope {
                organization_id: org,
                branch_id: branch,
                account_id: account,
                member_profile_id: member,
            };
            let series = services
                .daily_balances
                .daily_ending_balances(&scope, from, to)
                .await
                .map_err(AppError::from)?;
            let stats = series.stats();
            Ok(json!({ "series": series, "stats": stats }))
        }
        Command::EffectiveAccount { account, as_of } => {
            let resolved = services
                .snapshots
                .effective_at(account, as_of)
                .await
                .map_err(AppError::from)?;
            let exact = resolved.is_exact();
            Ok(json!({ "exact": exact, "snapshot": resolved.into_inner() }))
        }
        Command::GenerateInterest { batch } => {
            let txn = services.db().begin().await?;
            let generated = services
                .interest_batches
                .generate_entries(&txn, batch)
                .await
                .map_err(AppError::from)?;
            txn.commit().await?;

            info!(batch_id = %batch, entries = generated.entries.len(), "Interest batch committed");
            Ok(json!({
                "batch_id": batch,
                "entries": generated.entries.len(),
                "skipped": generated.skipped,
                "total_interest": generated.batch.total_interest,
                "total_tax": generated.batch.total_tax,
            }))
        }
        Command::VerifySummary {
            org,
            branch,
            member,
            account,
        } => {
            let key = SummaryKey {
                member_profile_id: member,
                account_id: account,
            };
            let report = services
                .member_ledger
                .verify_consistency(org, branch, key)
                .await
                .map_err(AppError::from)?;
            Ok(json!({
                "member_profile_id": member,
                "account_id": account,
                "summary_balance": report.summary_balance,
                "ledger_balance": report.ledger_balance,
                "consistent": report.consistent,
            }))
        }
    }
}
