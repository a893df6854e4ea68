//! Mapping of librdkafka errors onto [`BrokerError`] categories.

use complaints_core::BrokerError;
use rdkafka::error::KafkaError;
use rdkafka::types::RDKafkaErrorCode;

/// Classify a client error.
///
/// Commit and configuration failures are recognised by variant; everything
/// else by its librdkafka error code, falling back to
/// [`BrokerError::Transport`].
#[must_use]
pub fn classify(error: &KafkaError) -> BrokerError {
    let detail = error.to_string();
    match error {
        KafkaError::ClientConfig(..) | KafkaError::ClientCreation(_) => {
            BrokerError::Configuration(detail)
        }
        KafkaError::ConsumerCommit(_) => BrokerError::CommitFailed(detail),
        _ => match error.rdkafka_error_code() {
            Some(RDKafkaErrorCode::AllBrokersDown | RDKafkaErrorCode::BrokerTransportFailure) => {
                BrokerError::NoBrokersAvailable(detail)
            }
            Some(
                RDKafkaErrorCode::CoordinatorNotAvailable
                | RDKafkaErrorCode::NotCoordinator
                | RDKafkaErrorCode::CoordinatorLoadInProgress,
            ) => BrokerError::CoordinatorUnavailable(detail),
            _ => BrokerError::Transport(detail),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_brokers_down_is_no_brokers_available() {
        let error = KafkaError::MessageConsumption(RDKafkaErrorCode::AllBrokersDown);
        assert_eq!(classify(&error).category(), "no_brokers_available");
    }

    #[test]
    fn coordinator_codes_are_grouped() {
        for code in [
            RDKafkaErrorCode::CoordinatorNotAvailable,
            RDKafkaErrorCode::NotCoordinator,
            RDKafkaErrorCode::CoordinatorLoadInProgress,
        ] {
            let error = KafkaError::MessageConsumption(code);
            assert_eq!(classify(&error).category(), "coordinator_unavailable");
        }
    }

    #[test]
    fn commit_failures_are_recognised() {
        let error = KafkaError::ConsumerCommit(RDKafkaErrorCode::RebalanceInProgress);
        assert_eq!(classify(&error).category(), "commit_failed");
    }

    #[test]
    fn creation_failures_are_configuration_errors() {
        let error = KafkaError::ClientCreation("bad config".to_string());
        assert!(matches!(classify(&error), BrokerError::Configuration(_)));
    }

    #[test]
    fn other_codes_are_transport_errors() {
        let error = KafkaError::MessageConsumption(RDKafkaErrorCode::UnknownTopicOrPartition);
        assert!(matches!(classify(&error), BrokerError::Transport(_)));
    }
}
