//! Agent storefronts.
//!
//! Each agent owns at most one shop, addressed by slug. The storefront
//! page needs the wholesale list alongside the overrides so it can show
//! effective prices without a second round trip.

use serde_json::Value;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::database::repository::{ShopStore, UserStore};
use crate::database::shop_repository::Shop;
use crate::database::user_repository::Role;
use crate::error::{AppError, AppResult, DomainError, ValidationError};
use crate::pricing::{price_book, PriceTier};

/// Public storefront view for a slug
#[derive(Debug, Clone)]
pub struct ShopDetails {
    pub slug: String,
    pub name: String,
    pub custom_prices: Value,
    /// Wholesale list the overrides are layered on
    pub base_prices: Value,
}

pub struct ShopService {
    users: Arc<dyn UserStore>,
    shops: Arc<dyn ShopStore>,
}

impl ShopService {
    pub fn new(users: Arc<dyn UserStore>, shops: Arc<dyn ShopStore>) -> Self {
        Self { users, shops }
    }

    /// Create or reconfigure the caller's shop. Agents only.
    pub async fn setup_shop(
        &self,
        user_id: Uuid,
        role: Role,
        slug: &str,
        name: &str,
        custom_prices: Value,
    ) -> AppResult<Shop> {
        if role != Role::Agent {
            return Err(AppError::domain(DomainError::Forbidden {
                required: "Agent".to_string(),
            }));
        }

        let slug = normalize_slug(slug)?;
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::validation(ValidationError::MissingField {
                field: "name".to_string(),
            }));
        }
        if !custom_prices.is_object() {
            return Err(AppError::validation(ValidationError::InvalidField {
                field: "custom_prices".to_string(),
                reason: "expected an object mapping plan names to prices".to_string(),
            }));
        }

        if self.shops.slug_taken_by_other(&slug, user_id).await? {
            return Err(AppError::domain(DomainError::SlugTaken { slug }));
        }

        let shop = match self.shops.find_by_owner(user_id).await? {
            Some(existing) => {
                self.shops
                    .update(existing.id, &slug, name, custom_prices)
                    .await?
            }
            None => self.shops.create(user_id, &slug, name, custom_prices).await?,
        };

        // Denormalized onto the user row so /user-info can show the
        // shop link without a join.
        self.users.set_shop_slug(user_id, &shop.slug).await?;
        info!(user_id = %user_id, slug = %shop.slug, "shop configured");

        Ok(shop)
    }

    pub async fn shop_details(&self, slug: &str) -> AppResult<ShopDetails> {
        let shop = self
            .shops
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| AppError::domain(DomainError::ShopNotFound {
                slug: slug.to_string(),
            }))?;

        Ok(ShopDetails {
            slug: shop.slug,
            name: shop.name,
            custom_prices: shop.custom_prices,
            base_prices: price_book(PriceTier::Wholesale),
        })
    }
}

/// Slugs are lowercase alphanumerics and hyphens, at least 3 chars.
fn normalize_slug(raw: &str) -> AppResult<String> {
    let slug = raw.trim().to_lowercase();
    let valid = slug.len() >= 3
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');

    if valid {
        Ok(slug)
    } else {
        Err(AppError::validation(ValidationError::InvalidField {
            field: "slug".to_string(),
            reason: "use at least 3 lowercase letters, digits or hyphens".to_string(),
        }))
    }
}
