//! Property-Based Tests — Domain Layer Invariants
//!
//! Uses `proptest` to verify that domain components maintain their
//! invariants across random inputs.

use chrono::Utc;
use proptest::prelude::*;
use rust_decimal::Decimal;

use stablemint_core::domain::error::{ErrorClassification, ErrorKind, ProviderFailure};
use stablemint_core::domain::price::{PricePoint, PriceSeries};
use stablemint_core::domain::transaction::{OperationKind, TransactionRecord, TxStatus};

fn point(position: u64, cents: i64) -> PricePoint {
    PricePoint {
        position,
        timestamp: Utc::now(),
        value: Decimal::new(cents, 2),
    }
}

// ── Error Classifier Properties ─────────────────────────────

proptest! {
    /// Classification is pure: the same input always yields the same
    /// kind and preserves the original code and message.
    #[test]
    fn classifier_is_deterministic(
        code in proptest::option::of(-40_000i64..40_000),
        message in ".{0,64}",
    ) {
        let failure = ProviderFailure::new(code, message.clone());
        let first = ErrorClassification::classify(&failure);
        let second = ErrorClassification::classify(&failure);
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(first.code, code);
        prop_assert_eq!(first.message, message);
    }

    /// Known codes always win over message heuristics.
    #[test]
    fn classifier_codes_take_priority(message in ".{0,64}") {
        let rejected = ProviderFailure::new(Some(4001), message.clone());
        prop_assert_eq!(
            ErrorClassification::classify(&rejected).kind,
            ErrorKind::UserRejected
        );

        let funds = ProviderFailure::new(Some(-32000), message);
        prop_assert_eq!(
            ErrorClassification::classify(&funds).kind,
            ErrorKind::InsufficientFunds
        );
    }

    /// A "network" fragment in the message classifies transient when
    /// no known code is present.
    #[test]
    fn classifier_network_fragment_is_transient(
        prefix in "[a-z ]{0,16}",
        suffix in "[a-z ]{0,16}",
    ) {
        let failure = ProviderFailure::message(format!("{prefix}network{suffix}"));
        let classified = ErrorClassification::classify(&failure);
        prop_assert_eq!(classified.kind, ErrorKind::NetworkError);
        prop_assert!(classified.kind.is_transient());
    }
}

// ── Price Series Properties ─────────────────────────────────

proptest! {
    /// An assembled series is always ascending, within the window, and
    /// made only of points that were supplied.
    #[test]
    fn series_assembly_holds_invariants(
        window in 1usize..48,
        positions in proptest::collection::vec(0u64..100_000, 0..64),
    ) {
        let points: Vec<PricePoint> =
            positions.iter().map(|&p| point(p, 100)).collect();
        let series = PriceSeries::from_points(window, points);

        prop_assert!(series.len() <= window);
        for pair in series.points().windows(2) {
            prop_assert!(
                pair[0].position < pair[1].position,
                "positions must be strictly ascending: {} then {}",
                pair[0].position,
                pair[1].position
            );
        }
        for p in series.points() {
            prop_assert!(positions.contains(&p.position));
        }
    }

    /// Pushing arbitrary points never breaks the window bound or the
    /// ascending-position invariant.
    #[test]
    fn series_push_holds_invariants(
        window in 1usize..16,
        positions in proptest::collection::vec(0u64..10_000, 0..64),
    ) {
        let mut series = PriceSeries::new(window);
        for p in positions {
            series.push(point(p, 100));
            prop_assert!(series.len() <= window);
            for pair in series.points().windows(2) {
                prop_assert!(pair[0].position < pair[1].position);
            }
        }
    }
}

// ── Transaction Record Properties ───────────────────────────

proptest! {
    /// A record reaching a terminal status never transitions again,
    /// whatever sequence of transitions is attempted afterwards.
    #[test]
    fn terminal_records_are_frozen(
        first_terminal in prop_oneof![
            Just(TxStatus::Confirmed),
            Just(TxStatus::Failed),
        ],
        attempts in proptest::collection::vec(
            prop_oneof![
                Just(TxStatus::Submitted),
                Just(TxStatus::Pending),
                Just(TxStatus::Confirmed),
                Just(TxStatus::Failed),
            ],
            0..8,
        ),
    ) {
        let mut record =
            TransactionRecord::new(OperationKind::Mint, Decimal::ONE, "prop");
        prop_assert!(record.transition(TxStatus::Pending));
        prop_assert!(record.transition(first_terminal));

        for status in attempts {
            prop_assert!(!record.transition(status));
            prop_assert_eq!(record.status, first_terminal);
        }
    }
}
