use std::path::PathBuf;
use std::process::Output;

use assert_cmd::cargo::CommandCargoExt;

fn run(args: &[&str]) -> Output {
    std::process::Command::cargo_bin("skala-cli")
        .unwrap()
        .args(args)
        .output()
        .unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8(output.stdout.clone()).unwrap()
}

fn stderr(output: &Output) -> String {
    String::from_utf8(output.stderr.clone()).unwrap()
}

fn labeled_file(dir: &tempfile::TempDir) -> PathBuf {
    let path = dir.path().join("skala-asli.csv");
    std::fs::write(
        &path,
        "dimensi;pernyataan\n\
         Ekstraversi;Saya mudah bergaul dengan orang yang baru saya kenal\n\
         Ekstraversi;Saya senang menjadi pusat perhatian di keramaian\n\
         Neurotisisme;Saya mudah merasa cemas ketika keadaan tidak menentu\n",
    )
    .unwrap();
    path
}

fn payload_file(dir: &tempfile::TempDir) -> PathBuf {
    let path = dir.path().join("gen-z.json");
    std::fs::write(
        &path,
        serde_json::json!({
            "scale_name": "Skala Gen-Z",
            "dimensions": [
                {"name": "Ekstraversi", "items": [
                    {"text": "Gue gampang nyambung sama orang baru", "current_rubric": ["sociable"]},
                    {"text": "Gue suka jadi pusat perhatian"},
                ]},
                {"name": "Neurotisisme", "items": [
                    {"text": "Gue gampang overthinking"},
                ]},
            ],
        })
        .to_string(),
    )
    .unwrap();
    path
}

#[test]
fn records_prints_normalized_records() {
    let dir = tempfile::tempdir().unwrap();
    let input = labeled_file(&dir);

    let output = run(&["records", input.to_str().unwrap()]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("\"item-1\""));
    assert!(text.contains("Ekstraversi"));
    assert!(text.contains("Saya mudah merasa cemas ketika keadaan tidak menentu"));
}

#[test]
fn tree_renders_the_family_with_grafted_branches() {
    let dir = tempfile::tempdir().unwrap();
    let input = labeled_file(&dir);
    let payload = payload_file(&dir);

    let output = run(&[
        "tree",
        input.to_str().unwrap(),
        "--payload",
        payload.to_str().unwrap(),
    ]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let text = stdout(&output);
    assert!(text.contains("skala-asli"));
    assert!(text.contains("3 items, 1 branches"));
    assert!(text.contains("Skala Gen-Z"));
    assert!(text.contains("(650, 46)"));
}

#[test]
fn export_emits_the_nine_column_rows() {
    let dir = tempfile::tempdir().unwrap();
    let input = labeled_file(&dir);
    let payload = payload_file(&dir);

    let output = run(&[
        "export",
        input.to_str().unwrap(),
        "--payload",
        payload.to_str().unwrap(),
    ]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let text = stdout(&output);
    let lines: Vec<&str> = text.lines().collect();

    // Header plus three root items and three branch items.
    assert_eq!(lines.len(), 7);
    assert_eq!(lines[0].split('\t').count(), 9);
    assert!(lines[0].starts_with("scale_id\tscale_name\tparent_scale_id"));
    assert!(lines.iter().any(|l| l.contains("Gue gampang overthinking")));
}

#[test]
fn export_honors_the_delimiter_flag() {
    let dir = tempfile::tempdir().unwrap();
    let input = labeled_file(&dir);

    let output = run(&[
        "export",
        input.to_str().unwrap(),
        "--delimiter",
        "semicolon",
    ]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.starts_with("scale_id;scale_name;parent_scale_id"));
}

#[test]
fn json_dumps_the_node_collection() {
    let dir = tempfile::tempdir().unwrap();
    let input = labeled_file(&dir);

    let output = run(&["json", input.to_str().unwrap(), "--name", "Skala Asli"]);
    assert!(output.status.success());
    let text = stdout(&output);
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    let (_, root) = value.as_object().unwrap().iter().next().unwrap();
    assert_eq!(root["name"], "Skala Asli");
    assert_eq!(root["placement"]["kind"], "root");
    assert_eq!(root["dimensions"].as_array().unwrap().len(), 2);
}

#[test]
fn unlabeled_records_fail_with_a_pointer_to_the_service() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plain.txt");
    std::fs::write(&path, "Saya mudah bergaul\nSaya mudah cemas\n").unwrap();

    let output = run(&["tree", path.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("dimension labels"));
}

#[test]
fn unknown_commands_print_usage() {
    let output = run(&["frobnicate"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Usage: skala-cli"));
}
