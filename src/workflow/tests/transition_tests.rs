//! Unit tests for the transition table.

use crate::workflow::domain::{
    InvalidTransition, TaskStatus, TransitionFlags, TransitionRejection, WorkflowConfig,
    validate_transition,
};
use rstest::{fixture, rstest};

use TaskStatus::{Cancelled, Done, HumanReview, InProgress, InReview, Testing, Todo};

fn config_with(enable_human_review: bool, testing_requires_manual_exit: bool) -> WorkflowConfig {
    WorkflowConfig {
        enable_human_review,
        testing_requires_manual_exit,
        ..WorkflowConfig::default()
    }
}

#[fixture]
fn all_configs() -> Vec<WorkflowConfig> {
    vec![
        config_with(false, false),
        config_with(false, true),
        config_with(true, false),
        config_with(true, true),
    ]
}

/// Independent statement of the permitted edges.
fn is_listed(from: TaskStatus, to: TaskStatus, config: &WorkflowConfig) -> bool {
    let edges: &[(TaskStatus, TaskStatus, bool)] = &[
        (Todo, InProgress, true),
        (InProgress, Testing, true),
        (InProgress, InReview, !config.testing_requires_manual_exit),
        (Testing, InReview, true),
        (Testing, Done, true),
        (Testing, Cancelled, true),
        (InReview, HumanReview, config.enable_human_review),
        (InReview, Done, !config.enable_human_review),
        (InReview, InProgress, true),
        (InReview, Cancelled, true),
        (HumanReview, Done, true),
        (HumanReview, InProgress, true),
        (HumanReview, Cancelled, true),
        (Todo, Cancelled, true),
        (InProgress, Cancelled, true),
    ];
    edges
        .iter()
        .any(|&(edge_from, edge_to, open)| edge_from == from && edge_to == to && open)
}

#[rstest]
fn every_pair_matches_the_table(all_configs: Vec<WorkflowConfig>) {
    for config in &all_configs {
        for from in TaskStatus::ALL {
            for to in TaskStatus::ALL {
                let allowed = validate_transition(from, to, config).is_ok();
                assert_eq!(
                    allowed,
                    is_listed(from, to, config),
                    "{from} -> {to} with {config:?}"
                );
            }
        }
    }
}

#[rstest]
#[case(Done)]
#[case(Cancelled)]
fn terminal_statuses_have_no_outgoing_edges(
    #[case] terminal: TaskStatus,
    all_configs: Vec<WorkflowConfig>,
) {
    for config in &all_configs {
        for target in TaskStatus::ALL {
            let result = validate_transition(terminal, target, config);
            assert!(
                matches!(
                    result,
                    Err(InvalidTransition {
                        reason: TransitionRejection::TerminalStatus,
                        ..
                    })
                ),
                "{terminal} -> {target} should be terminal, got {result:?}"
            );
        }
    }
}

#[rstest]
#[case(Todo)]
#[case(InProgress)]
#[case(Testing)]
#[case(InReview)]
#[case(HumanReview)]
fn self_transitions_are_rejected(#[case] status: TaskStatus, all_configs: Vec<WorkflowConfig>) {
    for config in &all_configs {
        let result = validate_transition(status, status, config);
        assert_eq!(
            result.map_err(|err| err.reason),
            Err(TransitionRejection::SameStatus)
        );
    }
}

#[rstest]
#[case(Todo)]
#[case(InProgress)]
#[case(Testing)]
#[case(InReview)]
#[case(HumanReview)]
fn cancellation_is_always_open_from_non_terminal(
    #[case] status: TaskStatus,
    all_configs: Vec<WorkflowConfig>,
) {
    for config in &all_configs {
        assert!(validate_transition(status, Cancelled, config).is_ok());
    }
}

#[rstest]
fn default_config_blocks_testing_bypass() {
    let result = validate_transition(InProgress, InReview, &WorkflowConfig::default());
    assert_eq!(
        result,
        Err(InvalidTransition {
            from: InProgress,
            to: InReview,
            flags: TransitionFlags {
                enable_human_review: false,
                testing_requires_manual_exit: true,
            },
            reason: TransitionRejection::TestingRequiresManualExit,
        })
    );
}

#[rstest]
fn disabling_manual_exit_opens_testing_bypass() {
    assert!(validate_transition(InProgress, InReview, &config_with(false, false)).is_ok());
}

#[rstest]
#[case(false, HumanReview, Some(TransitionRejection::HumanReviewDisabled))]
#[case(false, Done, None)]
#[case(true, HumanReview, None)]
#[case(true, Done, Some(TransitionRejection::HumanReviewRequired))]
fn review_exit_depends_on_human_review_flag(
    #[case] enable_human_review: bool,
    #[case] target: TaskStatus,
    #[case] expected: Option<TransitionRejection>,
) {
    let config = config_with(enable_human_review, true);
    let result = validate_transition(InReview, target, &config).map_err(|err| err.reason);
    assert_eq!(result.err(), expected);
}

#[rstest]
fn rejection_message_names_pair_and_reason() {
    let err = validate_transition(Todo, Done, &WorkflowConfig::default())
        .expect_err("todo to done is not an edge");
    assert_eq!(
        err.to_string(),
        "cannot move task from todo to done: the workflow has no such transition"
    );
}
