use clap::Parser;
use purchase_tester_cli::commands::complete::CompleteArgs;
use purchase_tester_cli::{Cli, Commands};
use purchase_tester_core::CheckoutEnvironment;

fn complete_args(transaction: Option<&str>, offering: Option<&str>) -> CompleteArgs {
    CompleteArgs {
        transaction: transaction.map(str::to_string),
        offering: offering.map(str::to_string),
        event: None,
    }
}

#[test]
fn parses_complete_with_flags() {
    let cli = Cli::try_parse_from([
        "purchase-tester",
        "--home",
        "/tmp/pt",
        "complete",
        "--transaction",
        "txn_1",
        "--offering",
        "default",
    ])
    .unwrap();
    assert_eq!(cli.home.as_deref(), Some(std::path::Path::new("/tmp/pt")));
    match cli.command {
        Commands::Complete(args) => {
            let completion = args.completion().unwrap();
            assert_eq!(completion.transaction_id, "txn_1");
            assert_eq!(completion.offering_id, "default");
        }
        _ => panic!("expected complete"),
    }
}

#[test]
fn complete_needs_transaction_and_offering() {
    assert!(complete_args(None, Some("default")).completion().is_err());
    assert!(complete_args(Some("txn_1"), None).completion().is_err());
}

#[test]
fn complete_from_event_file() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("event.json");
    std::fs::write(
        &path,
        r#"{"name": "checkout.completed",
            "data": {"transaction_id": "txn_9",
                     "custom_data": {"offering_id": "summer", "app_user_id": "alice"}}}"#,
    )
    .unwrap();

    let args = CompleteArgs {
        transaction: None,
        offering: None,
        event: Some(path.clone()),
    };
    let completion = args.completion().unwrap();
    assert_eq!(completion.transaction_id, "txn_9");
    assert_eq!(completion.offering_id, "summer");

    // explicit offering wins over the echoed one
    let args = CompleteArgs {
        transaction: None,
        offering: Some("default".to_string()),
        event: Some(path),
    };
    assert_eq!(args.completion().unwrap().offering_id, "default");
}

#[test]
fn complete_rejects_other_events() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("event.json");
    std::fs::write(&path, r#"{"name": "checkout.loaded"}"#).unwrap();

    let args = CompleteArgs {
        transaction: None,
        offering: Some("default".to_string()),
        event: Some(path),
    };
    assert!(args.completion().is_err());
}

#[test]
fn setup_args_build_config() {
    let cli = Cli::try_parse_from([
        "purchase-tester",
        "setup",
        "--entitlement-key",
        "pdl_abc",
        "--checkout-key",
        "test_123",
        "--country",
        "DE",
        "--production",
    ])
    .unwrap();
    let Commands::Setup(args) = cli.command else {
        panic!("expected setup");
    };

    let mut base = purchase_tester_core::Config::default();
    base.retry.max_retries = 7;
    let config = args.into_config(Some(base));

    assert_eq!(config.entitlement_key, "pdl_abc");
    assert_eq!(config.checkout_environment, CheckoutEnvironment::Production);
    assert_eq!(config.country().as_deref(), Some("DE"));
    // retry tuning survives a re-run of setup
    assert_eq!(config.retry.max_retries, 7);
    assert_eq!(config.validate(), Ok(()));
}

#[test]
fn user_id_is_optional() {
    let cli = Cli::try_parse_from(["purchase-tester", "user"]).unwrap();
    assert!(matches!(cli.command, Commands::User { user_id: None }));
}
