use crate::engine::{Emitter, Parser, split_field};
use crate::{FieldValue, Options, ParseError, Record, Template};

fn compile(source: &str) -> Template {
    Template::compile(source).unwrap_or_else(|e| panic!("template failed to compile: {e}"))
}

fn run(source: &str, input: &str) -> Vec<Record> {
    let template = compile(source);
    Parser::new(&template).run_text(input).unwrap_or_else(|e| panic!("run failed: {e}"))
}

fn texts(records: &[Record], name: &str) -> Vec<String> {
    records.iter().map(|r| r.get(name).map(ToString::to_string).unwrap_or_default()).collect()
}

#[test]
fn users_separated_by_blank_lines() {
    let template = "\
Value NAME (\\w+)

Start
  ^User: (?P<NAME>\\w+)
  ^$ -> Record
";
    let template = compile(template);
    let parser = Parser::new(&template);
    let records = parser.run(["User: alice", "", "User: bob", ""]).unwrap();

    let expected: Vec<Record> =
        vec![[("NAME", "alice")].into_iter().collect(), [("NAME", "bob")].into_iter().collect()];
    assert_eq!(records, expected);
    assert_eq!(parser.template().header(), vec!["NAME"]);
    assert_eq!(records[1].get("NAME").and_then(FieldValue::as_text), Some("bob"));
}

#[test]
fn record_clears_values_between_records() {
    let template = "\
Value NAME (\\w+)
Value SHELL (\\S+)

Start
  ^User: ${NAME}
  ^Shell: ${SHELL}
  ^-- -> Record
";
    let input = "User: alice\nShell: /bin/bash\n--\nUser: bob\n--\n";
    let records = run(template, input);

    assert_eq!(texts(&records, "NAME"), vec!["alice", "bob"]);
    assert_eq!(texts(&records, "SHELL"), vec!["/bin/bash", ""]);
}

#[test]
fn filldown_persists_until_reassigned() {
    let template = "\
Value Filldown HOST (\\S+)
Value PORT (\\d+)

Start
  ^host ${HOST}
  ^port ${PORT} -> Record
  ^reset -> Clear
";
    let input = "host a\nport 1\nport 2\nreset\nport 3\nhost b\nport 4\n";
    let records = run(template, input);

    assert_eq!(texts(&records, "HOST"), vec!["a", "a", "a", "b"]);
    assert_eq!(texts(&records, "PORT"), vec!["1", "2", "3", "4"]);
}

#[test]
fn clear_all_drops_filldown() {
    let template = "\
Value Filldown HOST (\\S+)
Value PORT (\\d+)

Start
  ^host ${HOST}
  ^port ${PORT} -> Record
  ^reset -> Clearall
";
    let records = run(template, "host a\nport 1\nreset\nport 2\n");
    assert_eq!(texts(&records, "HOST"), vec!["a", ""]);
}

#[test]
fn list_collects_every_match_before_record() {
    let template = "\
Value GROUP (\\w+)
Value List MEMBER (\\w+)

Start
  ^group ${GROUP}
  ^  member ${MEMBER}
  ^end -> Record
";
    let input = "group wheel\n  member alice\n  member bob\n  member carol\nend\ngroup empty\nend\n";
    let records = run(template, input);

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].get("MEMBER"), Some(&FieldValue::from(vec!["alice", "bob", "carol"])));
    assert_eq!(records[1].get("MEMBER"), Some(&FieldValue::List(Vec::new())));
}

#[test]
fn required_suppresses_exactly_the_incomplete_records() {
    let template = "\
Value Required NAME (\\w+)
Value UID (\\d+)

Start
  ^name ${NAME}
  ^uid ${UID}
  ^-- -> Record
";
    let input = "name a\nuid 1\n--\nuid 2\n--\nname c\n--\nuid 4\n--\n";
    let template = compile(template);
    let result = Parser::new(&template).run_with_metrics(input, &Options::default()).unwrap();

    assert_eq!(texts(&result.records, "NAME"), vec!["a", "c"]);
    assert_eq!(texts(&result.records, "UID"), vec!["1", ""]);
    assert_eq!(result.metrics.records, 2);
    assert_eq!(result.metrics.suppressed, 2);
}

#[test]
fn first_matching_rule_wins() {
    let template = "\
Value KIND (\\w+)

Start
  ^(?P<KIND>first)\\b.* -> Record
  ^(?P<KIND>\\w+) -> Record
";
    let records = run(template, "first line\nsecond line\n");
    assert_eq!(texts(&records, "KIND"), vec!["first", "second"]);
}

#[test]
fn continue_extracts_several_values_from_one_line() {
    let template = "\
Value A (\\d+)
Value B (\\d+)

Start
  ^a=${A} -> Continue
  ^.*b=${B} -> Record
";
    let records = run(template, "a=1 b=2\na=3\nb=4\n");

    assert_eq!(texts(&records, "A"), vec!["1", "3"]);
    assert_eq!(texts(&records, "B"), vec!["2", "4"]);
}

#[test]
fn continue_record_keeps_values() {
    let template = "\
Value List ITEM (\\w+)

Start
  ^item ${ITEM} -> Continue.Record
  ^item \\w+ done -> Clear
";
    let records = run(template, "item a\nitem b done\nitem c\n");

    assert_eq!(records.len(), 3);
    assert_eq!(records[0].get("ITEM"), Some(&FieldValue::from(vec!["a"])));
    assert_eq!(records[1].get("ITEM"), Some(&FieldValue::from(vec!["a", "b"])));
    assert_eq!(records[2].get("ITEM"), Some(&FieldValue::from(vec!["c"])));
}

#[test]
fn unmatched_lines_are_skipped() {
    let template = "\
Value IFACE (\\S+)

Start
  ^interface ${IFACE} -> Record
";
    let input = "!\nbanner motd\ninterface Gi0/1\n  description uplink\ninterface Gi0/2\n";
    let template = compile(template);
    let result = Parser::new(&template).run_with_metrics(input, &Options::default()).unwrap();

    assert_eq!(texts(&result.records, "IFACE"), vec!["Gi0/1", "Gi0/2"]);
    assert_eq!(result.metrics.lines, 5);
    assert_eq!(result.metrics.matched_lines, 2);
}

const SECTIONS: &str = "\
Value Filldown CHASSIS (\\S+)
Value SLOT (\\d+)
Value MODEL (\\S+)

Start
  ^Chassis ${CHASSIS} -> Slots

Slots
  ^slot ${SLOT} ${MODEL} -> Record
  ^Chassis ${CHASSIS}
  ^--end-- -> End

EOF
";

#[test]
fn next_switches_state() {
    let records = run(SECTIONS, "slot 9 ignored\nChassis c1\nslot 1 m1\nslot 2 m2\nChassis c2\nslot 1 m3\n");

    assert_eq!(texts(&records, "CHASSIS"), vec!["c1", "c1", "c2"]);
    assert_eq!(texts(&records, "MODEL"), vec!["m1", "m2", "m3"]);
}

#[test]
fn end_state_stops_input_and_skips_eof_record() {
    let template = compile(SECTIONS);
    let input = "Chassis c1\nslot 1 m1\n--end--\nslot 2 m2\n";
    let result = Parser::new(&template).run_with_metrics(input, &Options::default()).unwrap();

    assert_eq!(texts(&result.records, "SLOT"), vec!["1"]);
    assert_eq!(result.metrics.final_state, "End");
    assert_eq!(result.metrics.lines, 3);
    assert!(!result.metrics.eof_record);
}

#[test]
fn eof_outside_start_commits_pending_values() {
    let template = "\
Value HOST (\\S+)
Value VERSION (\\S+)

Start
  ^Host: ${HOST} -> Details

Details
  ^Version: ${VERSION}
";
    let template = compile(template);
    let result = Parser::new(&template).run_with_metrics("Host: r1\nVersion: 15.2\n", &Options::default()).unwrap();

    assert!(result.metrics.eof_record);
    assert_eq!(texts(&result.records, "HOST"), vec!["r1"]);
    assert_eq!(texts(&result.records, "VERSION"), vec!["15.2"]);

    let disabled = Options { eof: false, ..Options::default() };
    let result = Parser::new(&template).run_with_metrics("Host: r1\nVersion: 15.2\n", &disabled).unwrap();
    assert!(result.records.is_empty());
}

#[test]
fn transition_to_undeclared_eof_stops_and_commits() {
    let template = "\
Value HOST (\\S+)

Start
  ^Host: ${HOST} -> EOF
";
    let template = compile(template);
    let result = Parser::new(&template).run_with_metrics("Host: r1\nHost: r2\n", &Options::default()).unwrap();

    assert_eq!(texts(&result.records, "HOST"), vec!["r1"]);
    assert_eq!(result.metrics.final_state, "EOF");
    assert_eq!(result.metrics.lines, 1);
    assert!(result.metrics.eof_record);
}

#[test]
fn eof_in_start_state_commits_nothing() {
    let template = "\
Value NAME (\\w+)

Start
  ^User: ${NAME}
";
    assert!(run(template, "User: alice\n").is_empty());
}

#[test]
fn declared_eof_state_disables_implicit_record() {
    let template = "\
Value HOST (\\S+)

Start
  ^Host: ${HOST} -> Details

Details
  ^x

EOF
";
    assert!(run(template, "Host: r1\n").is_empty());
}

#[test]
fn error_action_aborts_with_position() {
    let template = "\
Value NAME (\\w+)

Start
  ^User: ${NAME} -> Record
  ^\\S+ -> Error \"unexpected token\"
";
    let template = compile(template);
    let err = Parser::new(&template).run_text("User: alice\n\nbogus\nUser: bob\n").unwrap_err();

    assert_eq!(
        err,
        ParseError {
            line: 3,
            state: "Start".into(),
            message: Some("unexpected token".into()),
            text: "bogus".into(),
        }
    );
}

#[test]
fn fillup_backfills_earlier_records() {
    let template = "\
Value Fillup VLAN (\\d+)
Value PORT (\\S+)

Start
  ^port ${PORT} -> Record
  ^vlan ${VLAN} -> Record
";
    let records = run(template, "port p1\nport p2\nvlan 10\nport p3\nvlan 20\n");

    assert_eq!(texts(&records, "PORT"), vec!["p1", "p2", "", "p3", ""]);
    assert_eq!(texts(&records, "VLAN"), vec!["10", "10", "10", "20", "20"]);
}

#[test]
fn trace_records_rules_and_transitions() {
    let template = compile(SECTIONS);
    let options = Options { trace: true, ..Options::default() };
    let result = Parser::new(&template).run_with_metrics("noise\nChassis c1\nslot 1 m1\n", &options).unwrap();

    let trace = &result.metrics.trace;
    assert_eq!(trace.len(), 3);
    assert!(trace[0].rules.is_empty());
    assert_eq!(trace[1].rules, vec![6]);
    assert_eq!(trace[1].transition.as_deref(), Some("Slots"));
    assert_eq!(trace[2].state, "Slots");
    assert_eq!(trace[2].rules, vec![9]);
}

#[test]
fn runs_are_independent() {
    let template = compile(SECTIONS);
    let parser = Parser::new(&template);

    let first = parser.run_text("Chassis c1\nslot 1 m1\n").unwrap();
    let second = parser.run_text("slot 1 m1\n").unwrap();

    assert_eq!(first.len(), 1);
    assert!(second.is_empty());
}

#[test]
fn shared_template_across_threads() {
    let template = compile(SECTIONS);
    let inputs: Vec<String> = (0..4).map(|i| format!("Chassis c{i}\nslot {i} m{i}\nslot 9 x\n")).collect();

    let results: Vec<Vec<Record>> = std::thread::scope(|scope| {
        let handles: Vec<_> = inputs
            .iter()
            .map(|input| {
                let template = &template;
                scope.spawn(move || Parser::new(template).run_text(input).unwrap())
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for (i, records) in results.iter().enumerate() {
        assert_eq!(texts(records, "CHASSIS"), vec![format!("c{i}"), format!("c{i}")]);
    }
}

// --- Demo templates ---------------------------------------------------------

#[test]
fn group_demo_with_member_split() {
    let template = compile(include_str!("../../demos/group.template"));
    let records = Parser::new(&template).run_text(include_str!("../../demos/group.txt")).unwrap();
    let records = Emitter::new().with_hook(split_field("MEMBERS", ",")).emit(records);

    assert_eq!(template.header(), vec!["GROUP", "PASSWORD", "GID", "MEMBERS"]);
    assert_eq!(texts(&records, "GROUP"), vec!["root", "wheel", "adm", "users", "docker"]);
    assert_eq!(records[1].get("MEMBERS"), Some(&FieldValue::from(vec!["alice", "bob", "carol"])));
    assert_eq!(records[0].get("MEMBERS"), Some(&FieldValue::List(Vec::new())));
}

#[test]
fn passwd_demo() {
    let template = compile(include_str!("../../demos/passwd.template"));
    let records = Parser::new(&template).run_text(include_str!("../../demos/passwd.txt")).unwrap();

    assert_eq!(texts(&records, "USERNAME"), vec!["root", "daemon", "alice", "bob"]);
    assert_eq!(records[2].get("HOME"), Some(&FieldValue::from("/home/alice")));
    assert_eq!(records[2].get("GECOS"), Some(&FieldValue::from("Alice Liddell,,,")));
    assert_eq!(records[3].get("SHELL"), Some(&FieldValue::from("/usr/bin/zsh")));
}
