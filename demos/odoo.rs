use serde::Deserialize;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use odoors_xmlrpc::api::deserialize_odoo_nullable;
use odoors_xmlrpc::pprint::pprint_res;
use odoors_xmlrpc::{Odoo, OdooConfig};

const DEMO_HOST: &str = "https://demo.odoo.com";

#[derive(Deserialize, Debug)]
struct Partner {
    id: i64,
    name: String,
    #[serde(deserialize_with = "deserialize_odoo_nullable")]
    email: Option<String>,
}

async fn get_odoo() -> odoors_xmlrpc::Result<Odoo> {
    let config = match OdooConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            warn!(%err, "falling back to a demo database on {DEMO_HOST}");
            Odoo::start(DEMO_HOST).await?
        }
    };
    Odoo::login(&config).await
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let odoo = get_odoo().await?;

    let partners: Vec<serde_json::Value> = odoo
        .search_and_read(
            "res.partner",
            (("is_company", "=", true),),
            Some(vec!["name", "email"]),
            None,
            Some(5),
        )
        .await?;

    if let Err(err) = pprint_res(&partners, None) {
        println!("{err}");
    }

    for partner in partners {
        let partner: Partner = serde_json::from_value(partner)?;
        println!(
            "[{}] {} <{}>",
            partner.id,
            partner.name,
            partner.email.as_deref().unwrap_or("")
        );
    }

    Ok(())
}
