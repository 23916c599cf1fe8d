use super::*;

#[test]
fn absolute_base_joins_relative_paths() {
    assert_eq!(absolute_base("http://127.0.0.1:8080/", "/api"), "http://127.0.0.1:8080/api");
    assert_eq!(absolute_base("http://host", ""), "http://host");
}

#[test]
fn absolute_base_keeps_full_urls() {
    assert_eq!(absolute_base("http://ignored", "https://api.example.com/v1"), "https://api.example.com/v1");
}

#[test]
fn cli_parses_flattened_record_commands() {
    let cli = Cli::try_parse_from(["visitdesk", "customers", "batch-delete", "1", "2"]).unwrap();
    assert!(matches!(
        cli.command,
        Command::Customers(CustomersCommand {
            command: CustomersSubcommand::Record(RecordSubcommand::BatchDelete { ref ids })
        }) if ids == &[1, 2]
    ));

    let cli = Cli::try_parse_from(["visitdesk", "customers", "search", "acme"]).unwrap();
    assert!(matches!(
        cli.command,
        Command::Customers(CustomersCommand { command: CustomersSubcommand::Search { .. } })
    ));
}

#[test]
fn cli_collects_repeated_filters() {
    let cli = Cli::try_parse_from([
        "visitdesk", "visits", "list", "--page", "2", "--filter", "status=1", "--filter", "schoolId=4",
    ])
    .unwrap();
    let Command::Visits(VisitsCommand { command: VisitsSubcommand::Record(RecordSubcommand::List(args)) }) =
        cli.command
    else {
        panic!("expected visits list");
    };
    assert_eq!(args.page, Some(2));
    assert_eq!(args.filters, vec!["status=1", "schoolId=4"]);
}

#[test]
fn batch_delete_requires_ids() {
    assert!(Cli::try_parse_from(["visitdesk", "visits", "batch-delete"]).is_err());
}
