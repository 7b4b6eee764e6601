//! Sources generated scripts in real shells and checks what they complete.
//!
//! Each test is skipped when its shell is not installed.

use std::io::Write;
use std::process::Command;

use completion_schema_core::{
    Choice, CliOption, CommandLine, Completion, Config, KeyValue, KeyValueListCompletion,
    Positional, Subcommands, ValueListCompletion,
};
use completion_schema_gen::{Shell, generate};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// `example [-h] [-t TYPE] [--rpm-digest ALGO] [--perms LIST] [--opts LIST]
/// [--public|--secret] A B C`
fn example() -> CommandLine {
    let mut cmd = CommandLine::new("example");
    cmd.add_option(CliOption::new(["-h", "--help"]).with_final(true))
        .unwrap();
    cmd.add_option(
        CliOption::new(["-t", "--output-type"])
            .with_metavar("TYPE")
            .with_complete(Completion::choices(["rpm", "deb"])),
    )
    .unwrap();
    cmd.add_option(
        CliOption::new(["--rpm-digest"])
            .with_metavar("ALGO")
            .with_complete(Completion::choices(["md5", "sha256"]))
            .with_when("option_is -t --output-type -- rpm"),
    )
    .unwrap();
    cmd.add_option(
        CliOption::new(["--perms"])
            .with_metavar("LIST")
            .with_complete(Completion::ValueList(ValueListCompletion {
                values: vec![Choice::described("read", "Read access"), Choice::new("write")],
                separator: ",".into(),
                duplicates: false,
            })),
    )
    .unwrap();
    cmd.add_option(
        CliOption::new(["--opts"])
            .with_metavar("LIST")
            .with_complete(Completion::KeyValueList(KeyValueListCompletion {
                keys: vec![
                    KeyValue {
                        key: "mode".into(),
                        description: None,
                        completion: Some(Completion::choices(["fast", "slow"])),
                    },
                    KeyValue {
                        key: "verbose".into(),
                        description: None,
                        completion: None,
                    },
                ],
                separator: ",".into(),
                pair_separator: "=".into(),
            })),
    )
    .unwrap();
    let mut visibility = cmd.add_exclusive_group("visibility");
    visibility.add_option(CliOption::new(["--public"])).unwrap();
    visibility
        .add_option(CliOption::new(["--secret"]).with_hidden(true))
        .unwrap();
    for (number, name) in [(1, "one"), (2, "two"), (3, "three")] {
        cmd.add_positional(
            Positional::new(number)
                .with_metavar(name.to_uppercase())
                .with_complete(Completion::choices([name])),
        )
        .unwrap();
    }
    cmd
}

/// `tool [--mode MODE] run [--fast]`, where `--fast` needs `--mode x`.
fn tool() -> CommandLine {
    let mut cmd = CommandLine::new("tool");
    cmd.add_option(
        CliOption::new(["--mode"])
            .with_metavar("MODE")
            .with_complete(Completion::choices(["x", "y"])),
    )
    .unwrap();
    let subs = cmd.add_subcommands(Subcommands::new()).unwrap();
    let run = subs.add_command(CommandLine::new("run"));
    run.add_option(CliOption::new(["--fast"]).with_when("option_is --mode -- x"))
        .unwrap();
    cmd
}

fn installed(shell: &str) -> bool {
    let found = Command::new(shell)
        .arg("-c")
        .arg("exit 0")
        .output()
        .is_ok_and(|out| out.status.success());
    if !found {
        eprintln!("{shell} not found, skipping");
    }
    found
}

fn script_file(shell: Shell, cmd: &CommandLine, config: &Config) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(generate(shell, cmd, config).unwrap().as_bytes())
        .unwrap();
    file.flush().unwrap();
    file
}

fn lines(output: std::process::Output) -> Vec<String> {
    assert!(
        output.status.success(),
        "shell failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout)
        .unwrap()
        .lines()
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

const BASH_STUBS: &str = r#"
_init_completion() {
  words=("${COMP_WORDS[@]}")
  cword=$COMP_CWORD
  cur=${COMP_WORDS[COMP_CWORD]}
  prev=${COMP_WORDS[COMP_CWORD-1]}
}
compopt() { :; }
_filedir() { :; }
__ltrim_colon_completions() { :; }
"#;

/// Completes the last of `words` with the generated Bash script and
/// returns `COMPREPLY`.
fn bash_complete(cmd: &CommandLine, words: &[&str]) -> Vec<String> {
    let file = script_file(Shell::Bash, cmd, &Config::default());
    let body = format!(
        r#"{BASH_STUBS}
source "$1"
entry=$2
shift 2
COMP_WORDS=("$@")
COMP_CWORD=$(( $# - 1 ))
COMPREPLY=()
"$entry"
printf '%s\n' "${{COMPREPLY[@]}}""#
    );
    let output = Command::new("bash")
        .args(["--norc", "--noprofile", "-c", &body, "bash"])
        .arg(file.path())
        .arg(format!("_{}", cmd.prog))
        .args(words)
        .output()
        .unwrap();
    lines(output)
}

// ---------------------------------------------------------------------------
// Bash
// ---------------------------------------------------------------------------

#[test]
fn test_bash_positional_count() {
    if !installed("bash") {
        return;
    }
    assert_eq!(bash_complete(&example(), &["example", ""]), ["one"]);
    assert_eq!(bash_complete(&example(), &["example", "foo", ""]), ["two"]);
    assert_eq!(bash_complete(&example(), &["example", "foo", "bar", ""]), ["three"]);
    assert_eq!(
        bash_complete(&example(), &["example", "-t", "rpm", "foo", "bar", ""]),
        ["three"]
    );
}

#[test]
fn test_bash_condition_reads_every_value_form() {
    if !installed("bash") {
        return;
    }
    let cmd = example();
    let forms: [&[&str]; 4] = [
        &["--output-type=rpm"],
        &["-trpm"],
        &["-t", "rpm"],
        &["--output-type", "rpm"],
    ];
    for given in forms {
        let mut words = vec!["example"];
        words.extend_from_slice(given);
        words.push("--r");
        assert_eq!(bash_complete(&cmd, &words), ["--rpm-digest="], "after {given:?}");
    }
    assert!(bash_complete(&cmd, &["example", "-tdeb", "--r"]).is_empty());
    assert!(bash_complete(&cmd, &["example", "--r"]).is_empty());
}

#[test]
fn test_bash_option_arguments() {
    if !installed("bash") {
        return;
    }
    let cmd = example();
    assert_eq!(bash_complete(&cmd, &["example", "-t", ""]), ["rpm", "deb"]);
    assert_eq!(bash_complete(&cmd, &["example", "-t", "r"]), ["rpm"]);
    assert_eq!(bash_complete(&cmd, &["example", "--output-type=d"]), ["deb"]);
}

#[test]
fn test_bash_exclusive_options() {
    if !installed("bash") {
        return;
    }
    let cmd = example();
    assert_eq!(bash_complete(&cmd, &["example", "--p"]), ["--perms=", "--public"]);
    assert_eq!(bash_complete(&cmd, &["example", "--public", "--p"]), ["--perms="]);
    // Hidden options are never offered but still exclude their group.
    assert_eq!(bash_complete(&cmd, &["example", "--secret", "--p"]), ["--perms="]);
    assert!(bash_complete(&cmd, &["example", "--s"]).is_empty());
}

#[test]
fn test_bash_final_option() {
    if !installed("bash") {
        return;
    }
    let cmd = example();
    assert!(bash_complete(&cmd, &["example", "-"]).contains(&"-h".to_string()));
    assert!(bash_complete(&cmd, &["example", "-h", "-"]).is_empty());
    assert!(bash_complete(&cmd, &["example", "--help", "--"]).is_empty());
}

#[test]
fn test_bash_value_list_skips_given_values() {
    if !installed("bash") {
        return;
    }
    let cmd = example();
    assert_eq!(bash_complete(&cmd, &["example", "--perms", ""]), ["read", "write"]);
    assert_eq!(bash_complete(&cmd, &["example", "--perms", "read,"]), ["read,write"]);
    assert!(bash_complete(&cmd, &["example", "--perms", "read,write,"]).is_empty());
}

#[test]
fn test_bash_key_value_list_skips_given_keys() {
    if !installed("bash") {
        return;
    }
    let cmd = example();
    assert_eq!(
        bash_complete(&cmd, &["example", "--opts", ""]),
        ["mode=", "verbose"]
    );
    assert_eq!(
        bash_complete(&cmd, &["example", "--opts", "mode=fast,"]),
        ["mode=fast,verbose"]
    );
    assert_eq!(
        bash_complete(&cmd, &["example", "--opts", "verbose,"]),
        ["verbose,mode="]
    );
    assert!(bash_complete(&cmd, &["example", "--opts", "verbose,mode=slow,"]).is_empty());
    assert_eq!(
        bash_complete(&cmd, &["example", "--opts", "verbose,mode="]),
        ["verbose,mode=fast", "verbose,mode=slow"]
    );
}

#[test]
fn test_bash_subcommand_condition_on_parent_option() {
    if !installed("bash") {
        return;
    }
    let cmd = tool();
    assert_eq!(bash_complete(&cmd, &["tool", ""]), ["run"]);
    assert_eq!(bash_complete(&cmd, &["tool", "--mode", "x", "run", "--"]), ["--fast"]);
    assert!(bash_complete(&cmd, &["tool", "--mode", "y", "run", "--"]).is_empty());
    assert!(bash_complete(&cmd, &["tool", "run", "--"]).is_empty());
}

// ---------------------------------------------------------------------------
// Fish
// ---------------------------------------------------------------------------

/// Calls the generated Fish function `function` with `token`.
fn fish_call(cmd: &CommandLine, function: &str, token: &str) -> Vec<String> {
    let file = script_file(Shell::Fish, cmd, &Config::default());
    let output = Command::new("fish")
        .args(["--no-config", "-c", "source $SCRIPT; eval $FUNCTION '$TOKEN'"])
        .env("SCRIPT", file.path())
        .env("FUNCTION", function)
        .env("TOKEN", token)
        .output()
        .unwrap();
    lines(output)
}

#[test]
fn test_fish_value_list_skips_given_values() {
    if !installed("fish") {
        return;
    }
    let values = fish_call(&example(), "__example_list_1", "read,");
    assert_eq!(values, ["read,write\t"]);
}

#[test]
fn test_fish_key_value_list_skips_given_keys() {
    if !installed("fish") {
        return;
    }
    let cmd = example();
    assert_eq!(
        fish_call(&cmd, "__example_key_value_list_1", "mode=fast,"),
        ["mode=fast,verbose\t"]
    );
    assert_eq!(
        fish_call(&cmd, "__example_key_value_list_1", "verbose,"),
        ["verbose,mode=\t"]
    );
}

// ---------------------------------------------------------------------------
// Zsh
// ---------------------------------------------------------------------------

/// Runs `__tool_query QUERY...` over `words` and reports whether it held.
fn zsh_query(words: &[&str], query: &[&str]) -> bool {
    let config = Config {
        zsh_compdef: false,
        ..Config::default()
    };
    let file = script_file(Shell::Zsh, &tool(), &config);
    let body = r#"compdef() { :; }
source $SCRIPT
__tool_words=(${(z)WORDS})
if __tool_query ${(z)QUERY}; then print yes; else print no; fi"#;
    let output = Command::new("zsh")
        .args(["-f", "-c", body])
        .env("SCRIPT", file.path())
        .env("WORDS", words.join(" "))
        .env("QUERY", query.join(" "))
        .output()
        .unwrap();
    lines(output) == ["yes"]
}

#[test]
fn test_zsh_condition_on_parent_option() {
    if !installed("zsh") {
        return;
    }
    let query = ["option_is", "mode", "--", "x"];
    assert!(zsh_query(&["tool", "--mode", "x", "run"], &query));
    assert!(zsh_query(&["tool", "--mode=x", "run"], &query));
    assert!(!zsh_query(&["tool", "--mode", "y", "run"], &query));
    assert!(!zsh_query(&["tool", "run"], &query));
    assert!(zsh_query(&["tool", "--mode", "y", "run"], &["has_option", "mode"]));
}
