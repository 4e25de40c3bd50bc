//! End-to-end tests for the mail service, client and benchmark runner live under `tests/`.
