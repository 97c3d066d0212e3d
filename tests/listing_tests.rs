/// End-to-end tests of the customer resolution core: parse, reconcile, index
/// and list, using the same records an admin would see.
use gears_dashboard::customer_index::{CustomerIndex, NO_PARENT_LINKED};
use gears_dashboard::listing::{list_view, PageRequest, SortDirection};
use gears_dashboard::models::{Customer, Student, Team};
use gears_dashboard::name_parser::{CompanyNameGrammar, ParsedName};
use gears_dashboard::reconcile::{reconcile, reconcile_all};
use gears_dashboard::views::{student_rows, NO_TEAM};

fn customer(id: &str, company: &str, name: &str) -> Customer {
    Customer {
        id: id.to_string(),
        company_name: company.to_string(),
        name: name.to_string(),
        ..Default::default()
    }
}

fn student(id: i64, team_id: Option<i64>, customer_id: Option<&str>) -> Student {
    Student {
        id,
        first_name: "Jane".to_string(),
        last_name: "Doe".to_string(),
        grade: Some(5),
        team_id,
        customer_id: customer_id.map(str::to_string),
        created_at: chrono::Utc::now(),
    }
}

#[test]
fn test_program_customer_and_plain_customer() {
    let jane = reconcile(&customer("1", "FLL - Thunder - Jane Doe", "Doe, John"));
    assert_eq!(
        jane.parsed,
        ParsedName {
            program: "FLL".to_string(),
            team: "Thunder".to_string(),
            student: "Jane Doe".to_string(),
        }
    );
    assert_eq!(jane.contact_name, "Doe, John");

    let acme = reconcile(&customer("2", "Acme Corp", "Acme Corporation"));
    assert_eq!(acme.parsed, ParsedName::default());
    assert_eq!(acme.contact_name, "Acme Corp");

    let page = list_view(
        vec![jane, acme],
        "jane",
        "",
        SortDirection::Asc,
        PageRequest::default(),
    );
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].id(), "1");
}

#[test]
fn test_custom_delimiter() {
    let grammar = CompanyNameGrammar::new(" | ");
    let customers = vec![
        customer("1", "FTC | Sparks | Sam Lee", "Lee, Kim"),
        customer("2", "FTC - Sparks - Sam Lee", "Lee, Kim"),
    ];

    let reconciled = reconcile_all(&grammar, &customers);
    assert_eq!(reconciled[0].parsed.team, "Sparks");
    assert_eq!(reconciled[0].first_name, "Sam");
    assert!(!reconciled[1].is_associated());
    assert_eq!(reconciled[1].contact_name, "FTC - Sparks - Sam Lee");
}

#[test]
fn test_student_rows_resolve_parents_and_teams() {
    let index = CustomerIndex::build(reconcile_all(
        &CompanyNameGrammar::default(),
        &[customer("10", "FLL - Thunder - Jane Doe", "Doe, John")],
    ));
    let teams = vec![Team {
        id: 1,
        name: "Thunder".to_string(),
        team_number: Some(4567),
        program: "FLL".to_string(),
        archived: false,
        hall_of_fame: false,
        created_at: chrono::Utc::now(),
    }];

    let rows = student_rows(
        vec![
            student(1, Some(1), Some("10")),
            student(2, None, Some("99")),
            student(3, Some(42), None),
        ],
        &teams,
        &index,
    );

    assert_eq!(rows[0].parent, "Doe, John");
    assert_eq!(rows[0].team_name, "Thunder");
    assert_eq!(rows[1].parent, "Customer ID: 99");
    assert_eq!(rows[1].team_name, NO_TEAM);
    assert_eq!(rows[2].parent, NO_PARENT_LINKED);
    assert_eq!(rows[2].team_name, NO_TEAM);
}

#[test]
fn test_unknown_sort_key_falls_back_to_default() {
    let customers = vec![
        reconcile(&customer("1", "Zeta Inc", "")),
        reconcile(&customer("2", "alpha llc", "")),
    ];
    let page = list_view(
        customers,
        "",
        "no_such_column",
        SortDirection::Asc,
        PageRequest::new(Some(1), Some(10)),
    );
    let names: Vec<&str> = page.items.iter().map(|c| c.contact_name.as_str()).collect();
    assert_eq!(names, vec!["alpha llc", "Zeta Inc"]);
}
