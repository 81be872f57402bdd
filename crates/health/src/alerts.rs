//! Weight alert reaction.

use async_trait::async_trait;

use packhub_core::{DomainEvent, RecordedEvent};
use packhub_runtime::{Subscriber, SubscriberError};

use crate::dog::WeightAlert;

/// Logs a structured warning for every dispatched weight alert.
#[derive(Debug, Default)]
pub struct WeightAlertLogger;

#[async_trait]
impl Subscriber for WeightAlertLogger {
    fn kind(&self) -> &'static str {
        WeightAlert::KIND
    }

    async fn on_event(&self, event: &RecordedEvent) -> Result<(), SubscriberError> {
        let alert = event
            .payload::<WeightAlert>()
            .ok_or_else(|| SubscriberError::payload_mismatch(event.kind()))?;

        let change_percent =
            ((alert.current - alert.previous).abs() / alert.previous) * 100.0;
        tracing::warn!(
            dog_id = %alert.dog_id,
            previous_kg = alert.previous,
            current_kg = alert.current,
            direction = alert.direction.as_str(),
            change_percent = format!("{change_percent:.1}"),
            "sharp weight change detected"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use packhub_core::DogId;
    use crate::dog::WeightDirection;

    #[tokio::test]
    async fn handles_a_recorded_alert() {
        let event = RecordedEvent::record(WeightAlert {
            dog_id: DogId::new(),
            previous: 20.0,
            current: 25.0,
            direction: WeightDirection::Increased,
        });

        assert!(WeightAlertLogger.on_event(&event).await.is_ok());
    }
}
