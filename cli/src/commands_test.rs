use serde_json::json;

use super::*;

#[test]
fn parse_filter_reads_json_values_and_falls_back_to_text() {
    let (key, value) = parse_filter("status=1").unwrap();
    assert_eq!((key, value), ("status", json!(1)));

    let (key, value) = parse_filter("region=North East").unwrap();
    assert_eq!((key, value), ("region", json!("North East")));

    let (_, value) = parse_filter("tag=").unwrap();
    assert_eq!(value, json!(""));
}

#[test]
fn parse_filter_rejects_missing_key_or_separator() {
    assert!(matches!(parse_filter("status"), Err(CliError::InvalidFilter(_))));
    assert!(matches!(parse_filter("=1"), Err(CliError::InvalidFilter(_))));
}

#[test]
fn build_query_combines_paging_keyword_and_filters() {
    let args = ListArgs {
        page: Some(1),
        size: Some(20),
        keyword: Some("acme".to_owned()),
        filters: vec!["schoolId=4".to_owned()],
    };
    let query = build_query(args).unwrap();
    assert_eq!(query.page, Some(1));
    assert_eq!(query.size, Some(20));
    assert_eq!(query.keyword.as_deref(), Some("acme"));
    assert_eq!(query.filters.get("schoolId"), Some(&json!(4)));
}

#[test]
fn export_path_prefers_flag_then_server_name() {
    assert_eq!(export_path(Some(PathBuf::from("out.csv")), Some("x.xlsx"), "visits"), PathBuf::from("out.csv"));
    assert_eq!(export_path(None, Some("../../etc/visits.xlsx"), "visits"), PathBuf::from("visits.xlsx"));
    assert_eq!(export_path(None, None, "visits"), PathBuf::from("visits-export.xlsx"));
}

#[test]
fn render_menu_indents_children() {
    let menu = vec![MenuItem {
        path: "/system".to_owned(),
        title: "System".to_owned(),
        icon: None,
        children: vec![MenuItem {
            path: "/system/users".to_owned(),
            title: "Users".to_owned(),
            icon: None,
            children: Vec::new(),
        }],
    }];
    assert_eq!(render_menu(&menu), "System  /system\n  Users  /system/users\n");
}

#[test]
fn render_breadcrumb_joins_titles() {
    let crumbs = vec![
        Crumb { path: "/visits".to_owned(), title: "Visits".to_owned() },
        Crumb { path: "/visits/detail/3".to_owned(), title: "Visit Detail".to_owned() },
    ];
    assert_eq!(render_breadcrumb(&crumbs), "Visits > Visit Detail");
    assert_eq!(render_breadcrumb(&[]), "");
}

#[test]
fn describe_outcome_formats_each_verdict() {
    let proceed = GuardOutcome::Proceed { path: "/dashboard".to_owned(), title: "Dashboard - App".to_owned() };
    assert_eq!(describe_outcome(&proceed), "proceed /dashboard (Dashboard - App)");

    let denied = GuardOutcome::Redirect { to: "/dashboard".to_owned(), notice: Some("access denied".to_owned()) };
    assert_eq!(describe_outcome(&denied), "redirect /dashboard: access denied");

    let login = GuardOutcome::Redirect { to: "/login".to_owned(), notice: None };
    assert_eq!(describe_outcome(&login), "redirect /login");
}
