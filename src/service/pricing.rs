//! Pricing catalog business logic

use crate::domain::{
    normalize_suffix, CreateTldInput, PriceQuote, TldStatus, TldWithPrices, UpdateTldInput,
};
use crate::error::{AppError, Result};
use crate::repository::TldRepository;
use std::collections::HashSet;
use std::sync::Arc;
use validator::{Validate, ValidationError, ValidationErrors};

pub struct PricingService<R: TldRepository> {
    repo: Arc<R>,
}

fn duplicate_years_error() -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    let mut e = ValidationError::new("duplicate_years");
    e.message = Some("Each registration period may only appear once".into());
    errors.add("prices", e);
    errors
}

fn check_unique_years(tiers: &[crate::domain::PriceTierInput]) -> Result<()> {
    let mut seen = HashSet::new();
    for tier in tiers {
        if !seen.insert(tier.years) {
            return Err(AppError::Validation(duplicate_years_error()));
        }
    }
    Ok(())
}

impl<R: TldRepository> PricingService<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Resolve the authoritative registration price for a suffix and term.
    ///
    /// A missing or non-active TLD is unsupported; an active TLD without a
    /// tier for the requested term has no published price.
    pub async fn resolve_price(&self, suffix: &str, years: i32) -> Result<PriceQuote> {
        if suffix.is_empty() || !suffix.starts_with('.') {
            return Err(AppError::BadRequest(format!(
                "Invalid TLD suffix: {:?}",
                suffix
            )));
        }
        if !(1..=10).contains(&years) {
            return Err(AppError::BadRequest(
                "years must be between 1 and 10".to_string(),
            ));
        }

        let tld = self
            .repo
            .find_by_name(suffix)
            .await?
            .filter(|t| t.status == TldStatus::Active)
            .ok_or_else(|| AppError::UnsupportedTld(suffix.to_string()))?;

        let tier = self
            .repo
            .find_tier(tld.id, years)
            .await?
            .ok_or_else(|| {
                AppError::PricingUnavailable(format!("{} for {} year(s)", suffix, years))
            })?;

        Ok(PriceQuote {
            tld_id: tld.id,
            years,
            register_price: tier.register_price,
        })
    }

    pub async fn create_tld(&self, mut input: CreateTldInput) -> Result<TldWithPrices> {
        input.name = normalize_suffix(&input.name);
        input.validate()?;
        check_unique_years(&input.prices)?;

        if self.repo.find_by_name(&input.name).await?.is_some() {
            return Err(AppError::Conflict(format!(
                "TLD {} already exists",
                input.name
            )));
        }

        self.repo.create(&input).await
    }

    pub async fn get_tld(&self, id: i64) -> Result<TldWithPrices> {
        let tld = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("TLD {} not found", id)))?;
        let prices = self.repo.prices_for(tld.id).await?;
        Ok(TldWithPrices { tld, prices })
    }

    pub async fn list_tlds(&self, offset: i64, limit: i64) -> Result<(Vec<TldWithPrices>, i64)> {
        let tlds = self.repo.list(offset, limit).await?;
        let total = self.repo.count().await?;
        Ok((tlds, total))
    }

    pub async fn update_tld(&self, id: i64, mut input: UpdateTldInput) -> Result<TldWithPrices> {
        if let Some(name) = input.name.take() {
            input.name = Some(normalize_suffix(&name));
        }
        input.validate()?;
        if let Some(tiers) = &input.prices {
            check_unique_years(tiers)?;
        }
        self.repo.update(id, &input).await
    }

    pub async fn delete_tld(&self, id: i64) -> Result<()> {
        self.repo.delete(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Money, PriceTier, PriceTierInput, Tld};
    use crate::repository::MockTldRepository;
    use chrono::Utc;
    use mockall::predicate::*;

    fn tld(id: i64, name: &str, status: TldStatus) -> Tld {
        Tld {
            id,
            name: name.to_string(),
            status,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn tier(tld_id: i64, years: i32, register: i64) -> PriceTier {
        PriceTier {
            id: 1,
            tld_id,
            years,
            register_price: Money(register),
            renewal_price: Money(register),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_resolve_price_happy_path() {
        let mut repo = MockTldRepository::new();
        repo.expect_find_by_name()
            .with(eq(".com"))
            .returning(|_| Ok(Some(tld(1, ".com", TldStatus::Active))));
        repo.expect_find_tier()
            .with(eq(1), eq(2))
            .returning(|_, _| Ok(Some(tier(1, 2, 2598))));

        let service = PricingService::new(Arc::new(repo));
        let quote = service.resolve_price(".com", 2).await.unwrap();

        assert_eq!(quote.tld_id, 1);
        assert_eq!(quote.register_price, Money(2598));
    }

    #[tokio::test]
    async fn test_resolve_price_unknown_suffix() {
        let mut repo = MockTldRepository::new();
        repo.expect_find_by_name().returning(|_| Ok(None));

        let service = PricingService::new(Arc::new(repo));
        let err = service.resolve_price(".zz", 1).await.unwrap_err();
        assert!(matches!(err, AppError::UnsupportedTld(_)));
    }

    #[tokio::test]
    async fn test_resolve_price_disabled_tld_is_unsupported() {
        let mut repo = MockTldRepository::new();
        repo.expect_find_by_name()
            .returning(|_| Ok(Some(tld(1, ".xyz", TldStatus::Disabled))));

        let service = PricingService::new(Arc::new(repo));
        let err = service.resolve_price(".xyz", 1).await.unwrap_err();
        assert!(matches!(err, AppError::UnsupportedTld(_)));
    }

    #[tokio::test]
    async fn test_resolve_price_rejects_malformed_inputs() {
        // No repository calls expected for any of these
        let service = PricingService::new(Arc::new(MockTldRepository::new()));

        let err = service.resolve_price("", 1).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let err = service.resolve_price("com", 1).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let err = service.resolve_price(".com", 0).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let err = service.resolve_price(".com", 99).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_resolve_price_missing_tier() {
        let mut repo = MockTldRepository::new();
        repo.expect_find_by_name()
            .returning(|_| Ok(Some(tld(1, ".com", TldStatus::Active))));
        repo.expect_find_tier().returning(|_, _| Ok(None));

        let service = PricingService::new(Arc::new(repo));
        let err = service.resolve_price(".com", 7).await.unwrap_err();
        assert!(matches!(err, AppError::PricingUnavailable(_)));
    }

    #[tokio::test]
    async fn test_create_tld_rejects_duplicate_name() {
        let mut repo = MockTldRepository::new();
        repo.expect_find_by_name()
            .with(eq(".com"))
            .returning(|_| Ok(Some(tld(1, ".com", TldStatus::Active))));

        let service = PricingService::new(Arc::new(repo));
        let input = CreateTldInput {
            name: ".com".to_string(),
            status: Some(TldStatus::Active),
            prices: vec![PriceTierInput {
                years: 1,
                register_price: 1299,
                renewal_price: 1399,
            }],
        };

        let err = service.create_tld(input).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_create_tld_rejects_duplicate_years() {
        let repo = MockTldRepository::new();
        let service = PricingService::new(Arc::new(repo));

        let input = CreateTldInput {
            name: ".com".to_string(),
            status: Some(TldStatus::Active),
            prices: vec![
                PriceTierInput {
                    years: 1,
                    register_price: 1299,
                    renewal_price: 1399,
                },
                PriceTierInput {
                    years: 1,
                    register_price: 1199,
                    renewal_price: 1399,
                },
            ],
        };

        let err = service.create_tld(input).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_create_tld_rejects_bad_name() {
        let repo = MockTldRepository::new();
        let service = PricingService::new(Arc::new(repo));

        let input = CreateTldInput {
            name: "com".to_string(),
            status: Some(TldStatus::Active),
            prices: vec![PriceTierInput {
                years: 1,
                register_price: 1299,
                renewal_price: 1399,
            }],
        };

        let err = service.create_tld(input).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
