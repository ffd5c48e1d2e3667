//! Product validation participant.

use async_trait::async_trait;
use common::SagaKey;
use domain::{Envelope, Order, SagaStep};
use serde::{Deserialize, Serialize};

use crate::error::{ParticipantError, Result};
use crate::participant::{CompensationOutcome, Participant};
use crate::repository::{Repository, SagaEntity};
use crate::stock::ProductCatalog;

/// Record that the products of a saga were checked against the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductValidation {
    pub key: SagaKey,
    /// False once the validation was rolled back.
    pub success: bool,
}

impl SagaEntity for ProductValidation {
    const KIND: &'static str = "product_validation";

    fn key(&self) -> &SagaKey {
        &self.key
    }
}

/// Checks that every ordered product is known to the catalog.
pub struct ProductValidationParticipant<R, C>
where
    R: Repository<ProductValidation>,
    C: ProductCatalog,
{
    repository: R,
    catalog: C,
}

impl<R, C> ProductValidationParticipant<R, C>
where
    R: Repository<ProductValidation>,
    C: ProductCatalog,
{
    pub fn new(repository: R, catalog: C) -> Self {
        Self {
            repository,
            catalog,
        }
    }

    fn validate_products_informed(order: &Order) -> Result<()> {
        if order.products.is_empty() {
            return Err(ParticipantError::Validation(
                "Product list is empty!".to_string(),
            ));
        }
        if order.products.iter().any(|p| p.product.code.trim().is_empty()) {
            return Err(ParticipantError::Validation(
                "Product must be informed!".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl<R, C> Participant for ProductValidationParticipant<R, C>
where
    R: Repository<ProductValidation>,
    C: ProductCatalog,
{
    fn step(&self) -> SagaStep {
        SagaStep::ProductValidation
    }

    fn success_message(&self) -> &'static str {
        "Products are validated successfully!"
    }

    fn failure_message(&self) -> &'static str {
        "Fail to validate products"
    }

    async fn execute(&self, envelope: &mut Envelope) -> Result<()> {
        Self::validate_products_informed(&envelope.payload)?;

        for line in &envelope.payload.products {
            if !self.catalog.exists(&line.product.code).await? {
                return Err(ParticipantError::NotFound(format!(
                    "Product {} does not exist in catalog",
                    line.product.code
                )));
            }
        }

        self.repository
            .insert(ProductValidation {
                key: envelope.key(),
                success: true,
            })
            .await?;
        Ok(())
    }

    async fn compensate(&self, envelope: &mut Envelope) -> Result<CompensationOutcome> {
        let key = envelope.key();
        let Some(mut validation) = self.repository.find_by_key(&key).await? else {
            return Ok(CompensationOutcome::NothingToDo);
        };
        if !validation.success {
            return Ok(CompensationOutcome::NothingToDo);
        }

        validation.success = false;
        self.repository.save(validation).await?;
        Ok(CompensationOutcome::Done)
    }
}
