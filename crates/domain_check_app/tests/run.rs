use std::fs;
use std::path::PathBuf;

use domain_check_app::cli::Cli;
use domain_check_app::sheet::{Sheet, EMAIL_MATCH, RETRY_NOTE};
use pretty_assertions::assert_eq;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// `run` drives its own runtime, so the mock server lives on a separate one.
fn start_server(runtime: &tokio::runtime::Runtime) -> MockServer {
    runtime.block_on(async {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/down"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
            .mount(&server)
            .await;
        server
    })
}

fn cli_for(input: PathBuf, output: PathBuf) -> Cli {
    Cli {
        input,
        output: Some(output),
        timeout_ms: Some(2_000),
        max_retries: Some(1),
        ..Cli::default()
    }
}

#[test]
fn run_checks_pending_rows_and_writes_the_table() {
    engine_logging::initialize_for_tests();
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let server = start_server(&runtime);
    let base = server.uri();

    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("leads.csv");
    let output = dir.path().join("checked.csv");
    let report = dir.path().join("summary.json");
    fs::write(
        &input,
        format!(
            "Full Name,Email Domain,Company Domain,EmailMatch\n\
             Ada,{base}/a,{base}/b,\n\
             Bob,,{base}/b,\n\
             Cy,{base}/down,{base}/down,Pass\n\
             Di,{base}/a,{base}/down,fail\n"
        ),
    )
    .unwrap();

    let cli = Cli {
        report: Some(report.clone()),
        ..cli_for(input.clone(), output.clone())
    };
    let summary = domain_check_app::run(&cli).unwrap();

    let sheet = Sheet::load(&output).unwrap();
    let statuses: Vec<_> = (0..sheet.len())
        .map(|row| {
            (
                sheet.value(row, EMAIL_MATCH).unwrap().to_string(),
                sheet.value(row, RETRY_NOTE).unwrap().to_string(),
            )
        })
        .collect();
    assert_eq!(
        statuses,
        vec![
            ("Pass".to_string(), String::new()),
            ("Fail".to_string(), "FetchErr:MissingURL".to_string()),
            ("Pass".to_string(), String::new()),
            ("Fail".to_string(), "FetchErr:200|503".to_string()),
        ]
    );

    assert_eq!(summary.rows, 4);
    assert_eq!(summary.count("Pass"), 2);
    assert_eq!(summary.count("Fail"), 2);
    let attempts: Vec<(u64, usize)> = summary
        .rounds
        .iter()
        .map(|round| (round.timeout_ms, round.attempted))
        .collect();
    assert_eq!(attempts, vec![(2_000, 3), (4_000, 2)]);

    let json: serde_json::Value = serde_json::from_slice(&fs::read(&report).unwrap()).unwrap();
    assert_eq!(json["rows"], 4);
    assert_eq!(json["note_counts"]["FetchErr:MissingURL"], 1);

    // Input is left alone when an output path is given.
    let original = Sheet::load(&input).unwrap();
    assert_eq!(original.value(0, EMAIL_MATCH), Some(""));
}

#[test]
fn run_without_pending_rows_rewrites_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("done.csv");
    fs::write(
        &input,
        "Email Domain,Company Domain,EmailMatch\nunreachable.invalid,other.invalid,PASS\n",
    )
    .unwrap();

    let cli = Cli {
        input: input.clone(),
        ..Cli::default()
    };
    let summary = domain_check_app::run(&cli).unwrap();

    assert!(summary.rounds.is_empty());
    assert_eq!(summary.output, input);
    assert_eq!(
        fs::read_to_string(&input).unwrap(),
        "Email Domain,Company Domain,EmailMatch,RetryNote\nunreachable.invalid,other.invalid,Pass,\n"
    );
}

#[test]
fn invalid_settings_fail_before_touching_the_table() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("leads.csv");
    let contents = "Email Domain,Company Domain\na.com,b.com\n";
    fs::write(&input, contents).unwrap();

    let cli = Cli {
        concurrency: Some(50),
        ..cli_for(input.clone(), dir.path().join("out.csv"))
    };
    assert!(domain_check_app::run(&cli).is_err());
    assert!(!dir.path().join("out.csv").exists());
    assert_eq!(fs::read_to_string(&input).unwrap(), contents);
}
