//! Seed the checkout database from a YAML file.
//!
//! ```yaml
//! users:
//!   - id: 1
//!     userType: dealer
//!     dealerTier: large
//! products:
//!   - id: 1
//!     name: Black Tea 1kg
//!     sku: TEA-1
//!     categoryId: 3
//!     prices: { retail: "100", dealer_small: "95", dealer_medium: "90", dealer_large: "80", dealer_main: "75" }
//!     visibility: { customer: true, dealer: true, dealer_main: true }
//!     stock: 50
//! campaigns: []
//! ```
//!
//! Rows are upserted by id, so the file can be re-applied. Campaign usage
//! counters survive a re-seed.

use std::collections::BTreeSet;
use std::path::Path;

use secrecy::SecretString;
use serde::Deserialize;
use tierstore_checkout::db::{self, CampaignRepository, ProductRepository, UserRepository};
use tierstore_core::campaign::Campaign;
use tierstore_core::{Product, UserIdentity, UserType};
use tracing::{error, info};

/// Contents of a seed file.
#[derive(Debug, Default, Deserialize)]
pub struct SeedFile {
    #[serde(default)]
    pub users: Vec<UserIdentity>,
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub campaigns: Vec<Campaign>,
}

/// Check a seed file, returning one message per problem.
#[must_use]
pub fn validate_seed(seed: &SeedFile) -> Vec<String> {
    let mut errors = Vec::new();

    let mut seen = BTreeSet::new();
    for user in &seed.users {
        if !seen.insert(user.id) {
            errors.push(format!("user {}: duplicate id", user.id));
        }
        if (user.user_type == UserType::Dealer) != user.dealer_tier.is_some() {
            errors.push(format!(
                "user {}: dealer tier must be set exactly for dealers",
                user.id
            ));
        }
    }

    let mut seen = BTreeSet::new();
    for product in &seed.products {
        if !seen.insert(product.id) {
            errors.push(format!("product {}: duplicate id", product.id));
        }
        if !product.prices.is_valid() {
            errors.push(format!("product {}: negative price", product.id));
        }
    }

    let mut seen = BTreeSet::new();
    for campaign in &seed.campaigns {
        if !seen.insert(campaign.id) {
            errors.push(format!("campaign {}: duplicate id", campaign.id));
        }
        if let Err(e) = campaign.validate() {
            errors.push(format!("campaign {}: {e}", campaign.id));
        }
    }

    errors
}

/// Seed users, products and campaigns from a YAML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, fails validation,
/// or a database operation fails.
pub async fn catalog(file_path: &str, dry_run: bool) -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading seed file");

    // Read and validate YAML before connecting to database
    let content = tokio::fs::read_to_string(path).await?;
    let seed: SeedFile = serde_yaml::from_str(&content)?;

    info!(
        users = seed.users.len(),
        products = seed.products.len(),
        campaigns = seed.campaigns.len(),
        "Parsed seed file"
    );

    let errors = validate_seed(&seed);
    if !errors.is_empty() {
        error!("Seed validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(format!("{} validation errors found", errors.len()).into());
    }

    if dry_run {
        info!("Dry run; seed file is valid");
        return Ok(());
    }

    let database_url = std::env::var("CHECKOUT_DATABASE_URL")
        .map(SecretString::from)
        .map_err(|_| "CHECKOUT_DATABASE_URL not set")?;
    let pool = db::create_pool(&database_url).await?;
    info!("Connected to database");

    let users = UserRepository::new(&pool);
    for user in &seed.users {
        users.upsert(user).await?;
    }
    users.sync_id_sequence().await?;

    let products = ProductRepository::new(&pool);
    for product in &seed.products {
        products.upsert(product).await?;
    }
    products.sync_id_sequence().await?;

    let campaigns = CampaignRepository::new(&pool);
    for campaign in &seed.campaigns {
        campaigns.upsert(campaign).await?;
    }
    campaigns.sync_id_sequence().await?;

    info!("Seeding complete!");
    info!("  Users: {}", seed.users.len());
    info!("  Products: {}", seed.products.len());
    info!("  Campaigns: {}", seed.campaigns.len());

    Ok(())
}
