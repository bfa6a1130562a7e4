//! vault-ops: operator CLI for deploying, configuring and managing the vault.
//!
//! Every command reads configuration from the environment (see `Config`) and
//! signs with `PRIVATE_KEY`, except `status`, `roles show` and
//! `rebalance-equal --dry-run`, which only read.

use std::path::PathBuf;

use alloy::primitives::{Address, U256};
use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

use vault_backend::{
    config::Config,
    init_tracing,
    services::{
        configurator::configure_vault,
        deployer::{deploy_vault, DeployParams, VaultArtifact},
        provider::{ensure_network, read_provider, signer_provider},
        rebalance::execute_plan,
        RpcVaultSource, VaultOperator, VaultSource,
    },
    types::{AmountView, HeadroomView, PlanResponse, RoleReportResponse, StrategyResponse},
};
use vault_core::{
    can_allocate, max_allocatable, parse_amount, AllocationPlan, DepositLimit, Network, RoleMask,
    RoleUpdate,
};

#[derive(Parser)]
#[command(name = "vault-ops", version, about = "Operate a multi-strategy ERC-4626 vault")]
struct Cli {
    /// Network to act on; defaults to DEFAULT_NETWORK
    #[arg(long, global = true)]
    network: Option<Network>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Deploy and initialize a new vault, then save the deployment record
    Deploy {
        /// Compiled vault artifact; defaults to VAULT_ARTIFACT
        #[arg(long)]
        artifact: Option<PathBuf>,
    },

    /// Grant the admin every role and set the deposit limit
    Configure {
        /// Defaults to ADMIN_ADDRESS, then the signer
        #[arg(long)]
        admin: Option<Address>,

        /// Human units or `unlimited`; defaults to MAX_DEPOSIT_LIMIT
        #[arg(long)]
        deposit_limit: Option<String>,
    },

    /// Print vault totals, strategies and an account's roles
    Status {
        /// Account to report on; defaults to the signer, if any
        #[arg(long)]
        account: Option<Address>,
    },

    #[command(flatten)]
    Write(WriteCommand),
}

/// Commands that act as the signer
#[derive(Subcommand)]
enum WriteCommand {
    /// Register a strategy with the vault
    AddStrategy { strategy: Address },

    /// Move a strategy's debt to `amount`
    UpdateDebt { strategy: Address, amount: String },

    /// Cap a strategy's debt; `unlimited` removes the cap
    SetMaxDebt { strategy: Address, amount: String },

    /// Split total assets evenly across the default queue
    RebalanceEqual {
        /// Print the plan without sending transactions
        #[arg(long)]
        dry_run: bool,
    },

    /// Inspect or change role bitmasks
    Roles {
        #[command(subcommand)]
        command: RolesCommand,
    },

    /// Human units or `unlimited`
    SetDepositLimit { limit: String },

    /// Realize a strategy's gains or losses
    ProcessReport { strategy: Address },

    /// Approve the vault to spend the signer's assets
    Approve { amount: String },

    /// Deposit assets, approving first when the allowance is short
    Deposit { amount: String },

    /// Withdraw assets to the signer
    Withdraw { amount: String },

    /// Burn shares for assets
    Redeem { shares: String },
}

#[derive(Subcommand)]
enum RolesCommand {
    /// Decode an account's role bitmask
    Show { account: Address },

    /// Replace an account's roles
    Set {
        account: Address,
        /// Role names, `all`, or raw masks
        #[arg(required = true)]
        roles: Vec<String>,
    },

    /// Add roles to an account
    Add {
        account: Address,
        #[arg(required = true)]
        roles: Vec<String>,
    },

    /// Remove roles from an account
    Remove {
        account: Address,
        #[arg(required = true)]
        roles: Vec<String>,
    },

    /// Give an account every role
    GrantAll { account: Address },

    /// Take every role from an account
    RevokeAll { account: Address },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    run(cli, &config).await
}

async fn run(cli: Cli, config: &Config) -> anyhow::Result<()> {
    let network = cli.network.unwrap_or(config.default_network);

    match cli.command {
        Command::Deploy { artifact } => deploy(config, network, artifact).await,
        Command::Configure {
            admin,
            deposit_limit,
        } => configure(config, network, admin, deposit_limit).await,
        Command::Status { account } => status(config, network, account).await,
        Command::Write(WriteCommand::Roles {
            command: RolesCommand::Show { account },
        }) => show_roles(config, network, account).await,
        Command::Write(WriteCommand::RebalanceEqual { dry_run: true }) => {
            let source = connect_reader(config, network).await?;
            preview_equal(&source).await
        }
        Command::Write(command) => {
            let operator = connect_operator(config, network).await?;
            run_write(&operator, command).await
        }
    }
}

async fn connect_operator(config: &Config, network: Network) -> anyhow::Result<VaultOperator> {
    let (provider, account) = signer_provider(config, network)?;
    ensure_network(&provider, network).await?;
    let vault = config.vault_address(network)?;

    info!(network = %network, vault = %vault, operator = %account, "Operator connected");

    Ok(VaultOperator::connect(provider, account, vault, config.receipt_timeout).await?)
}

async fn connect_reader(config: &Config, network: Network) -> anyhow::Result<RpcVaultSource> {
    let provider = read_provider(config, network)?;
    ensure_network(&provider, network).await?;
    let vault = config.vault_address(network)?;
    Ok(RpcVaultSource::connect(provider, vault).await?)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Parse role arguments into one mask
fn parse_roles(roles: &[String]) -> anyhow::Result<RoleMask> {
    roles.iter().try_fold(RoleMask::EMPTY, |acc, name| {
        let mask: RoleMask = name.parse()?;
        Ok(acc | mask)
    })
}

/// Debt cap in human units, or `unlimited` for `U256::MAX`
fn parse_cap(text: &str, decimals: u8) -> anyhow::Result<U256> {
    if text.trim().eq_ignore_ascii_case("unlimited") {
        return Ok(U256::MAX);
    }
    Ok(parse_amount(text, decimals)?)
}

async fn deploy(config: &Config, network: Network, artifact: Option<PathBuf>) -> anyhow::Result<()> {
    let artifact_path = artifact.unwrap_or_else(|| config.vault_artifact.clone());
    let artifact = VaultArtifact::load(&artifact_path)?;

    let (provider, deployer) = signer_provider(config, network)?;
    ensure_network(&provider, network).await?;
    let params = DeployParams::from_config(config, network, deployer)?;

    let record = deploy_vault(&provider, deployer, &artifact, &params, config.receipt_timeout).await?;
    let path = record
        .save(&config.deployments_dir)
        .context("vault deployed but the deployment record could not be saved")?;

    info!(path = %path.display(), "Deployment record saved");
    print_json(&record)
}

async fn configure(
    config: &Config,
    network: Network,
    admin: Option<Address>,
    deposit_limit: Option<String>,
) -> anyhow::Result<()> {
    let operator = connect_operator(config, network).await?;
    let admin = match admin {
        Some(admin) => admin,
        None => config.admin_or(operator.account())?,
    };
    let limit_text = deposit_limit.unwrap_or_else(|| config.max_deposit_limit.clone());
    let limit = DepositLimit::parse(&limit_text, operator.decimals())?;

    let report = configure_vault(&operator, admin, limit).await?;
    print_json(&report)
}

async fn status(config: &Config, network: Network, account: Option<Address>) -> anyhow::Result<()> {
    let source = connect_reader(config, network).await?;
    let account = match account {
        Some(account) => Some(account),
        None => signer_provider(config, network).ok().map(|(_, account)| account),
    };

    let decimals = source.asset_decimals();
    let (snapshot, strategies) = futures::try_join!(source.snapshot(), source.strategies())?;
    let headroom = max_allocatable(&strategies, snapshot.total_debt);

    let roles = match account {
        Some(account) => Some(RoleReportResponse::new(
            account,
            source.roles_of(account).await?,
        )),
        None => None,
    };

    print_json(&json!({
        "network": network,
        "vault": source.vault_address(),
        "total_assets": AmountView::new(snapshot.total_assets, decimals),
        "total_supply": AmountView::new(snapshot.total_supply, decimals),
        "total_debt": AmountView::new(snapshot.total_debt, decimals),
        "total_idle": AmountView::new(snapshot.total_idle, decimals),
        "deposit_limit": snapshot.deposit_limit.format(decimals),
        "max_allocatable": HeadroomView::new(headroom, decimals),
        "can_allocate": AmountView::new(can_allocate(snapshot.total_idle, headroom), decimals),
        "strategies": strategies
            .iter()
            .map(|s| StrategyResponse::new(s, snapshot.total_assets, decimals))
            .collect::<Vec<_>>(),
        "roles": roles,
    }))
}

async fn show_roles(config: &Config, network: Network, account: Address) -> anyhow::Result<()> {
    let source = connect_reader(config, network).await?;
    let mask = source.roles_of(account).await?;
    print_json(&RoleReportResponse::new(account, mask))
}

async fn run_write(operator: &VaultOperator, command: WriteCommand) -> anyhow::Result<()> {
    let decimals = operator.decimals();

    match command {
        WriteCommand::AddStrategy { strategy } => {
            operator
                .require(|c| c.can_add_strategy, "add strategies")
                .await?;
            let tx_hash = operator.add_strategy(strategy).await?;
            print_json(&json!({ "strategy": strategy, "tx_hash": tx_hash }))
        }

        WriteCommand::UpdateDebt { strategy, amount } => {
            let target = parse_amount(&amount, decimals)?;
            operator
                .require(|c| c.can_manage_debt, "update strategy debt")
                .await?;
            let tx_hash = operator.update_debt(strategy, target).await?;
            print_json(&json!({
                "strategy": strategy,
                "target_debt": AmountView::new(target, decimals),
                "tx_hash": tx_hash,
            }))
        }

        WriteCommand::SetMaxDebt { strategy, amount } => {
            let cap = parse_cap(&amount, decimals)?;
            operator
                .require(|c| c.can_manage_max_debt, "set strategy max debt")
                .await?;
            let tx_hash = operator.set_max_debt(strategy, cap).await?;
            print_json(&json!({
                "strategy": strategy,
                "max_debt": AmountView::new(cap, decimals),
                "tx_hash": tx_hash,
            }))
        }

        WriteCommand::RebalanceEqual { dry_run: true } => preview_equal(operator.source()).await,
        WriteCommand::RebalanceEqual { dry_run: false } => rebalance_equal(operator).await,

        WriteCommand::Roles { command } => {
            let (account, update) = match command {
                RolesCommand::Set { account, roles } => {
                    (account, RoleUpdate::Set(parse_roles(&roles)?))
                }
                RolesCommand::Add { account, roles } => {
                    (account, RoleUpdate::Add(parse_roles(&roles)?))
                }
                RolesCommand::Remove { account, roles } => {
                    (account, RoleUpdate::Remove(parse_roles(&roles)?))
                }
                RolesCommand::GrantAll { account } => (account, RoleUpdate::Set(RoleMask::ALL)),
                RolesCommand::RevokeAll { account } => (account, RoleUpdate::Set(RoleMask::EMPTY)),
                RolesCommand::Show { account } => {
                    let mask = operator.source().roles_of(account).await?;
                    return print_json(&RoleReportResponse::new(account, mask));
                }
            };

            let (tx_hash, mask) = operator.update_roles(account, update).await?;
            print_json(&json!({
                "tx_hash": tx_hash,
                "roles": RoleReportResponse::new(account, mask),
            }))
        }

        WriteCommand::SetDepositLimit { limit } => {
            let limit = DepositLimit::parse(&limit, decimals)?;
            operator
                .require(|c| c.can_set_deposit_limit, "set the deposit limit")
                .await?;
            let tx_hash = operator.set_deposit_limit(limit).await?;
            print_json(&json!({ "deposit_limit": limit.format(decimals), "tx_hash": tx_hash }))
        }

        WriteCommand::ProcessReport { strategy } => {
            operator
                .require(|c| c.can_report, "process reports")
                .await?;
            let tx_hash = operator.process_report(strategy).await?;
            print_json(&json!({ "strategy": strategy, "tx_hash": tx_hash }))
        }

        WriteCommand::Approve { amount } => {
            let amount = parse_amount(&amount, decimals)?;
            let tx_hash = operator.approve(amount).await?;
            print_json(&json!({ "approved": AmountView::new(amount, decimals), "tx_hash": tx_hash }))
        }

        WriteCommand::Deposit { amount } => deposit(operator, &amount).await,

        WriteCommand::Withdraw { amount } => {
            let amount = parse_amount(&amount, decimals)?;
            let position = operator.source().position_of(operator.account()).await?;
            if !position.can_withdraw(amount) {
                bail!(
                    "cannot withdraw {}: position is worth {}",
                    vault_core::format_amount(amount, decimals),
                    vault_core::format_amount(position.assets, decimals)
                );
            }
            let tx_hash = operator.withdraw(amount).await?;
            print_json(&json!({ "withdrawn": AmountView::new(amount, decimals), "tx_hash": tx_hash }))
        }

        WriteCommand::Redeem { shares } => {
            let shares = parse_amount(&shares, decimals)?;
            let tx_hash = operator.redeem(shares).await?;
            print_json(&json!({ "redeemed_shares": AmountView::new(shares, decimals), "tx_hash": tx_hash }))
        }
    }
}

async fn deposit(operator: &VaultOperator, amount: &str) -> anyhow::Result<()> {
    let decimals = operator.decimals();
    let amount = parse_amount(amount, decimals)?;
    let position = operator.source().position_of(operator.account()).await?;

    if amount > position.asset_balance {
        bail!(
            "cannot deposit {}: wallet holds {}",
            vault_core::format_amount(amount, decimals),
            vault_core::format_amount(position.asset_balance, decimals)
        );
    }

    let approve_tx = if position.needs_approval(amount) {
        info!(allowance = %position.allowance, "Allowance too low, approving first");
        Some(operator.approve(amount).await?)
    } else {
        None
    };

    let tx_hash = operator.deposit(amount).await?;
    print_json(&json!({
        "deposited": AmountView::new(amount, decimals),
        "approve_tx_hash": approve_tx,
        "tx_hash": tx_hash,
    }))
}

async fn plan_equal<S: VaultSource>(source: &S) -> anyhow::Result<AllocationPlan> {
    let (snapshot, strategies) = futures::try_join!(source.snapshot(), source.strategies())?;
    Ok(AllocationPlan::equal(&snapshot, &strategies)?)
}

/// Print the plan an equal rebalance would run; needs no signer.
async fn preview_equal<S: VaultSource>(source: &S) -> anyhow::Result<()> {
    let plan = plan_equal(source).await?;
    print_json(&PlanResponse::new(&plan, source.asset_decimals()))
}

async fn rebalance_equal(operator: &VaultOperator) -> anyhow::Result<()> {
    operator
        .require(|c| c.can_manage_debt, "update strategy debt")
        .await?;

    let mut plan = plan_equal(operator.source()).await?;

    let summary = execute_plan(operator, &mut plan).await;
    print_json(&json!({ "plan": plan, "summary": summary }))?;

    if summary.failed > 0 {
        warn!(failed = summary.failed, "Some debt updates failed");
        bail!("{} of {} debt updates failed", summary.failed, plan.tasks.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn local_config(pairs: &[(&str, &str)]) -> Config {
        Config::from_lookup(|key| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_dry_run_needs_no_signer() {
        // Nothing listens on port 9, so the run stops at the first RPC call
        let config = local_config(&[("SEPOLIA_RPC_URL", "http://127.0.0.1:9")]);

        let cli = Cli::try_parse_from(["vault-ops", "rebalance-equal", "--dry-run"]).unwrap();
        let err = run(cli, &config).await.unwrap_err();
        assert!(!err.to_string().contains("PRIVATE_KEY"), "{err}");

        let cli = Cli::try_parse_from(["vault-ops", "rebalance-equal"]).unwrap();
        let err = run(cli, &config).await.unwrap_err();
        assert!(err.to_string().contains("PRIVATE_KEY not set"), "{err}");
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_roles_combines_names() {
        let roles = ["DEBT_MANAGER".to_string(), "reporting-manager".to_string()];
        assert_eq!(parse_roles(&roles).unwrap().to_string(), "96");
        assert!(parse_roles(&["nope".to_string()]).is_err());
    }

    #[test]
    fn test_parse_cap() {
        assert_eq!(parse_cap("unlimited", 6).unwrap(), U256::MAX);
        assert_eq!(parse_cap("2.5", 6).unwrap(), U256::from(2_500_000u64));
        assert!(parse_cap("1.0000001", 6).is_err());
    }

    #[test]
    fn test_parse_subcommands() {
        let cli = Cli::try_parse_from([
            "vault-ops",
            "--network",
            "mainnet",
            "roles",
            "add",
            "0x0000000000000000000000000000000000000001",
            "DEBT_MANAGER",
        ])
        .unwrap();
        assert_eq!(cli.network, Some(Network::Mainnet));
        assert!(matches!(
            cli.command,
            Command::Write(WriteCommand::Roles {
                command: RolesCommand::Add { .. }
            })
        ));

        let cli = Cli::try_parse_from(["vault-ops", "rebalance-equal", "--dry-run"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Write(WriteCommand::RebalanceEqual { dry_run: true })
        ));
    }
}
