//! Unit tests for the review workflow.

mod transition_tests;
