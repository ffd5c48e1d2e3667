//! Topic directory: the destinations saga components address each other by.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::status::EventSource;

/// Every transport destination used by the saga.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum Topic {
    /// Entry point: an external trigger publishes new sagas here.
    StartSaga,
    /// Result inbox of the orchestrator; every participant replies here.
    BaseOrchestrator,
    FinishSuccess,
    FinishFail,
    ProductValidationSuccess,
    ProductValidationFail,
    PaymentSuccess,
    PaymentFail,
    InventorySuccess,
    InventoryFail,
    /// Final envelope after the orchestrator stamped the outcome.
    NotifyEnding,
}

impl Topic {
    pub const ALL: [Topic; 11] = [
        Topic::StartSaga,
        Topic::BaseOrchestrator,
        Topic::FinishSuccess,
        Topic::FinishFail,
        Topic::ProductValidationSuccess,
        Topic::ProductValidationFail,
        Topic::PaymentSuccess,
        Topic::PaymentFail,
        Topic::InventorySuccess,
        Topic::InventoryFail,
        Topic::NotifyEnding,
    ];

    /// Returns the transport name of the topic.
    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::StartSaga => "start-saga",
            Topic::BaseOrchestrator => "base-orchestrator",
            Topic::FinishSuccess => "finish-success",
            Topic::FinishFail => "finish-fail",
            Topic::ProductValidationSuccess => "product-validation-success",
            Topic::ProductValidationFail => "product-validation-fail",
            Topic::PaymentSuccess => "payment-success",
            Topic::PaymentFail => "payment-fail",
            Topic::InventorySuccess => "inventory-success",
            Topic::InventoryFail => "inventory-fail",
            Topic::NotifyEnding => "notify-ending",
        }
    }

    /// Returns the step whose execute or compensate inbox this is, if any.
    pub fn step(&self) -> Option<SagaStep> {
        SagaStep::FORWARD_ORDER
            .into_iter()
            .find(|step| step.execute_topic() == *self || step.compensate_topic() == *self)
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for Topic {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl FromStr for Topic {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Topic::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| DomainError::UnknownTopic(s.to_string()))
    }
}

impl TryFrom<String> for Topic {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Topic> for &'static str {
    fn from(topic: Topic) -> Self {
        topic.as_str()
    }
}

/// A participant step of the saga.
///
/// Each step owns a `{success, fail}` topic pair: messages on the success
/// topic ask the participant to execute, messages on the fail topic ask it
/// to compensate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SagaStep {
    ProductValidation,
    Payment,
    Inventory,
}

impl SagaStep {
    /// The order in which steps run on the forward path.
    pub const FORWARD_ORDER: [SagaStep; 3] = [
        SagaStep::ProductValidation,
        SagaStep::Payment,
        SagaStep::Inventory,
    ];

    /// Topic that asks this step to run its forward action.
    pub fn execute_topic(&self) -> Topic {
        match self {
            SagaStep::ProductValidation => Topic::ProductValidationSuccess,
            SagaStep::Payment => Topic::PaymentSuccess,
            SagaStep::Inventory => Topic::InventorySuccess,
        }
    }

    /// Topic that asks this step to compensate.
    pub fn compensate_topic(&self) -> Topic {
        match self {
            SagaStep::ProductValidation => Topic::ProductValidationFail,
            SagaStep::Payment => Topic::PaymentFail,
            SagaStep::Inventory => Topic::InventoryFail,
        }
    }

    /// Source stamped on envelopes this step publishes.
    pub fn source(&self) -> EventSource {
        match self {
            SagaStep::ProductValidation => EventSource::ProductValidationService,
            SagaStep::Payment => EventSource::PaymentService,
            SagaStep::Inventory => EventSource::InventoryService,
        }
    }

    /// Looks up the step owned by a source, if the source is a participant.
    pub fn from_source(source: EventSource) -> Option<SagaStep> {
        SagaStep::FORWARD_ORDER
            .into_iter()
            .find(|step| step.source() == source)
    }

    /// Short human name used in history messages and logs.
    pub fn name(&self) -> &'static str {
        match self {
            SagaStep::ProductValidation => "product validation",
            SagaStep::Payment => "payment",
            SagaStep::Inventory => "inventory",
        }
    }
}

impl std::fmt::Display for SagaStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
