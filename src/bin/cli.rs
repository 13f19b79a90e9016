use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use ulimi_store::config::{CascadePolicy, ReferentialIntegrity};
use ulimi_store::model::OrderStatus;
use ulimi_store::policy::{Action, Resource};
use ulimi_store::{stats, AppContext, Authenticator, Config};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory holding the collection files. Overrides ULIMI_DATA_DIR.
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Reference checking on writes. Overrides ULIMI_INTEGRITY.
    #[arg(long, value_enum)]
    integrity: Option<IntegrityArg>,

    /// Which products a farm delete takes with it. Overrides ULIMI_CASCADE.
    #[arg(long, value_enum)]
    cascade: Option<CascadeArg>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(ValueEnum, Clone, Copy)]
enum IntegrityArg {
    Strict,
    Lenient,
}

impl From<IntegrityArg> for ReferentialIntegrity {
    fn from(arg: IntegrityArg) -> Self {
        match arg {
            IntegrityArg::Strict => ReferentialIntegrity::Strict,
            IntegrityArg::Lenient => ReferentialIntegrity::Lenient,
        }
    }
}

#[derive(ValueEnum, Clone, Copy)]
enum CascadeArg {
    Transitive,
    FarmIdOnly,
}

impl From<CascadeArg> for CascadePolicy {
    fn from(arg: CascadeArg) -> Self {
        match arg {
            CascadeArg::Transitive => CascadePolicy::Transitive,
            CascadeArg::FarmIdOnly => CascadePolicy::FarmIdOnly,
        }
    }
}

#[derive(ValueEnum, Clone, Copy)]
enum CollectionArg {
    Farms,
    Crops,
    Products,
    Orders,
    Users,
}

#[derive(Subcommand, Clone)]
enum Commands {
    List { collection: CollectionArg },
    Sensors { farm_id: Option<String> },
    Login { email: String, password: String },
    Logout,
    Whoami,
    Dashboard,
    Analytics,
    Compare { farm_ids: Vec<String> },
    DeleteFarm { id: String },
    DeleteCrop { id: String },
    DeleteProduct { id: String },
    DeleteUser { id: String },
    Approve { id: String },
    Reject { id: String },
    OrderStatus { id: String, status: String },
    Dangling,
    Reset,
}

fn print<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    if let Some(mode) = cli.integrity {
        config.integrity = mode.into();
    }
    if let Some(policy) = cli.cascade {
        config.cascade = policy.into();
    }

    let ctx = AppContext::open(config)
        .with_context(|| "failed to open the Ulimi data directory")?;
    let domain = ctx.domain();

    match cli.command {
        Commands::List { collection } => match collection {
            CollectionArg::Farms => print(&domain.farms())?,
            CollectionArg::Crops => print(&domain.crops())?,
            CollectionArg::Products => print(&domain.products())?,
            CollectionArg::Orders => print(&domain.orders())?,
            CollectionArg::Users => print(&domain.users())?,
        },
        Commands::Sensors { farm_id } => {
            ctx.authorize(Action::ViewSensors, Resource::Any)?;
            match farm_id {
                Some(id) => print(&domain.sensors_for_farm(&id))?,
                None => print(domain.sensors())?,
            }
        }
        Commands::Login { email, password } => {
            let user = ctx.session().login(&email, &password).await?;
            println!("Logged in as {} ({})", user.name, user.role);
        }
        Commands::Logout => {
            ctx.session().logout()?;
            println!("OK");
        }
        Commands::Whoami => match ctx.session().current_user() {
            Some(user) => print(&user)?,
            None => println!("Not logged in"),
        },
        Commands::Dashboard => {
            let user = ctx.authorize(Action::ViewDashboard, Resource::Any)?;
            print(&stats::dashboard(&domain.snapshot(), &user))?;
        }
        Commands::Analytics => {
            ctx.authorize(Action::ViewAnalytics, Resource::Any)?;
            let data = domain.snapshot();
            print(&serde_json::json!({
                "totalRevenue": stats::total_revenue(&data),
                "cropBreakdown": stats::crop_breakdown(&data),
                "farmsByProvince": stats::farms_by_province(&data),
                "productRevenue": stats::product_revenue(&data),
            }))?;
        }
        Commands::Compare { farm_ids } => {
            ctx.authorize(Action::CompareFarms, Resource::Any)?;
            let ids: Vec<&str> = farm_ids.iter().map(String::as_str).collect();
            print(&stats::compare_farms(&domain.snapshot(), &ids))?;
        }
        Commands::DeleteFarm { id } => {
            let Some(farm) = domain.farm(&id) else {
                bail!("no farm {}", id);
            };
            ctx.authorize(Action::ManageFarms, Resource::Farm(&farm))?;
            domain.delete_farm(&id)?;
            println!("OK");
        }
        Commands::DeleteCrop { id } => {
            let Some(farm) = domain.crop(&id).and_then(|c| domain.farm(&c.farm_id)) else {
                bail!("no crop {} on a known farm", id);
            };
            ctx.authorize(Action::ManageCrops, Resource::Farm(&farm))?;
            domain.delete_crop(&id)?;
            println!("OK");
        }
        Commands::DeleteProduct { id } => {
            let Some(product) = domain.product(&id) else {
                bail!("no product {}", id);
            };
            ctx.authorize(Action::ListProduce, Resource::Product(&product))?;
            domain.delete_product(&id)?;
            println!("OK");
        }
        Commands::DeleteUser { id } => {
            let Some(user) = domain.user(&id) else {
                bail!("no user {}", id);
            };
            ctx.authorize(Action::ManageUsers, Resource::User(&user))?;
            domain.delete_user(&id)?;
            println!("OK");
        }
        Commands::Approve { id } => {
            ctx.authorize(Action::ReviewProducts, Resource::Any)?;
            if domain.product(&id).is_none() {
                bail!("no product {}", id);
            }
            domain.approve_product(&id)?;
            println!("OK");
        }
        Commands::Reject { id } => {
            ctx.authorize(Action::ReviewProducts, Resource::Any)?;
            if domain.product(&id).is_none() {
                bail!("no product {}", id);
            }
            domain.reject_product(&id)?;
            println!("OK");
        }
        Commands::OrderStatus { id, status } => {
            let status: OrderStatus = status.parse()?;
            let Some(order) = domain.order(&id) else {
                bail!("no order {}", id);
            };
            ctx.authorize(Action::ManageOrders, Resource::Order(&order))?;
            domain.update_order_status(&id, status)?;
            println!("OK");
        }
        Commands::Dangling => print(&domain.dangling_order_items())?,
        Commands::Reset => {
            ctx.authorize(Action::ManageUsers, Resource::Any)?;
            domain.reset()?;
            println!("OK");
        }
    }

    Ok(())
}
