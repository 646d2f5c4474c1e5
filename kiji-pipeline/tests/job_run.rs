mod common;

use std::fs;
use std::path::Path;

use common::{init_tracing, job, write_archive};
use kiji_common::CorpusRecord;
use kiji_config::OutputFormat;
use kiji_pipeline::{run_job, JobReport, Pipeline};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

fn read_rows(path: &Path) -> Vec<CorpusRecord> {
    let mut reader = csv::Reader::from_path(path).unwrap();
    let headers = reader.headers().unwrap().clone();
    assert_eq!(headers.iter().collect::<Vec<_>>(), ["index", "date", "text", "links"]);
    reader.deserialize().collect::<Result<_, _>>().unwrap()
}

fn run(inputs: Vec<std::path::PathBuf>, output: &Path) -> JobReport {
    let spec = job("test", inputs, output.to_path_buf(), OutputFormat::Csv);
    run_job(&spec, &Pipeline::default(), &CancellationToken::new()).unwrap()
}

#[test]
fn identical_text_under_different_urls_is_written_once() {
    init_tracing();
    let tmp = TempDir::new().unwrap();
    let archive = tmp.path().join("a.warc");
    write_archive(
        &archive,
        &[
            ("https://a.example.jp/1", "<p>同じ本文です。</p>"),
            ("https://b.example.jp/2", "<div><p>同じ本文です。</p></div>"),
            ("https://c.example.jp/3", "<p>別の本文です。</p>"),
        ],
    );
    let out = tmp.path().join("out.csv");

    let report = run(vec![archive], &out);
    assert_eq!(report.records_read, 3);
    assert_eq!(report.exact_duplicates, 1);
    assert_eq!(report.retained, 2);

    let rows = read_rows(&out);
    let texts: Vec<_> = rows.iter().map(|r| r.text.as_str()).collect();
    assert_eq!(texts, ["同じ本文です。", "別の本文です。"]);
    assert_eq!(rows[0].index, 0);
    assert_eq!(rows[1].index, 1);
}

#[test]
fn pages_without_visible_text_consume_no_index() {
    init_tracing();
    let tmp = TempDir::new().unwrap();
    let archive = tmp.path().join("a.warc");
    write_archive(
        &archive,
        &[
            ("https://a.example.jp/1", "<script>track()</script><style>p{}</style>"),
            ("https://a.example.jp/2", "<p>本文</p>"),
        ],
    );
    let out = tmp.path().join("out.csv");

    let report = run(vec![archive], &out);
    assert_eq!(report.empty_dropped, 1);

    let rows = read_rows(&out);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].index, 0);
    assert_eq!(rows[0].text, "本文");
}

#[test]
fn indices_run_across_files_in_name_order() {
    init_tracing();
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("in");
    fs::create_dir(&dir).unwrap();
    write_archive(
        &dir.join("2.warc"),
        &[("https://x.jp/c", "<p>三</p>"), ("https://x.jp/d", "<p>四</p>")],
    );
    write_archive(
        &dir.join("1.warc"),
        &[("https://x.jp/a", "<p>一</p>"), ("https://x.jp/b", "<p>二</p>")],
    );
    fs::write(dir.join("notes.txt"), "not an archive").unwrap();
    let out = tmp.path().join("out.csv");

    let report = run(vec![dir], &out);
    assert_eq!(report.files_processed, 2);

    let rows = read_rows(&out);
    let indices: Vec<_> = rows.iter().map(|r| r.index).collect();
    let texts: Vec<_> = rows.iter().map(|r| r.text.as_str()).collect();
    assert_eq!(indices, [0, 1, 2, 3]);
    assert_eq!(texts, ["一", "二", "三", "四"]);
}

#[test]
fn unreadable_and_malformed_files_do_not_stop_the_job() {
    init_tracing();
    let tmp = TempDir::new().unwrap();
    let missing = tmp.path().join("missing.warc");

    let broken = tmp.path().join("broken.warc");
    let mut data = common::warc_response("https://x.jp/a", "text/html", "<p>先頭の記事</p>");
    data.extend_from_slice(b"garbage that is not a record\r\n");
    data.extend(common::warc_response("https://x.jp/b", "text/html", "<p>届かない</p>"));
    fs::write(&broken, data).unwrap();

    let good = tmp.path().join("good.warc");
    write_archive(&good, &[("https://x.jp/c", "<p>最後の記事</p>")]);
    let out = tmp.path().join("out.csv");

    let report = run(vec![missing, broken, good], &out);
    assert_eq!(report.files_failed, 2);
    assert_eq!(report.warc_records, 2);
    assert_eq!(report.files_processed, 1);

    let rows = read_rows(&out);
    let texts: Vec<_> = rows.iter().map(|r| r.text.as_str()).collect();
    assert_eq!(texts, ["先頭の記事", "最後の記事"]);
    assert_eq!(rows[1].index, 1);
}

#[test]
fn dates_and_links_reach_the_row() {
    init_tracing();
    let tmp = TempDir::new().unwrap();
    let archive = tmp.path().join("a.warc");
    write_archive(
        &archive,
        &[(
            "https://news.example.jp/article/1",
            r#"<nav><a href="/top">トップ</a></nav>
               <p>2023年06月21日 14:30</p>
               <p>政府が発表した。<a href="/detail">詳細</a><a href="/other">他</a></p>"#,
        )],
    );
    let out = tmp.path().join("out.csv");
    run(vec![archive], &out);

    let rows = read_rows(&out);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].date, "2023-06-21 14:30");
    assert_eq!(rows[0].text, "政府が発表した。 詳細 他");
    assert_eq!(rows[0].links, "/detail");
}

#[test]
fn text_sink_writes_one_file_per_record() {
    init_tracing();
    let tmp = TempDir::new().unwrap();
    let archive = tmp.path().join("a.warc");
    write_archive(
        &archive,
        &[
            ("https://news.example.jp/article/42", r#"<p>本文 <a href="/next">次へ</a></p>"#),
            ("https://news.example.jp/", "<p>トップ</p>"),
        ],
    );
    let out_dir = tmp.path().join("texts");
    let spec = job("text", vec![archive], out_dir.clone(), OutputFormat::Text);
    let report = run_job(&spec, &Pipeline::default(), &CancellationToken::new()).unwrap();
    assert_eq!(report.retained, 2);

    let first = fs::read_to_string(out_dir.join("42_0.txt")).unwrap();
    assert_eq!(first, "本文 次へ\n\nLinks:\n/next");

    let names: Vec<_> = fs::read_dir(&out_dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    assert_eq!(names.len(), 2);
    assert!(names.iter().any(|n| n.ends_with("_1.txt") && n.len() == 32 + 6));
}

#[test]
fn cancellation_before_start_skips_every_file() {
    init_tracing();
    let tmp = TempDir::new().unwrap();
    let archive = tmp.path().join("a.warc");
    write_archive(&archive, &[("https://x.jp/a", "<p>本文</p>")]);
    let out = tmp.path().join("out.csv");

    let cancel = CancellationToken::new();
    cancel.cancel();
    let spec = job("cancelled", vec![archive], out.clone(), OutputFormat::Csv);
    let report = run_job(&spec, &Pipeline::default(), &cancel).unwrap();

    assert!(report.cancelled);
    assert_eq!(report.files_processed, 0);
    assert!(read_rows(&out).is_empty());
}

#[test]
fn each_job_has_its_own_dedup_scope_and_counter() {
    init_tracing();
    let tmp = TempDir::new().unwrap();
    let archive = tmp.path().join("a.warc");
    write_archive(&archive, &[("https://x.jp/a", "<p>共通の記事</p>")]);

    let first = run(vec![archive.clone()], &tmp.path().join("one.csv"));
    let second = run(vec![archive], &tmp.path().join("two.csv"));
    assert_eq!(first.retained, 1);
    assert_eq!(second.retained, 1);
    assert_eq!(read_rows(&tmp.path().join("two.csv"))[0].index, 0);
}

#[test]
fn non_html_records_are_counted_but_not_read() {
    init_tracing();
    let tmp = TempDir::new().unwrap();
    let archive = tmp.path().join("a.warc");
    let mut data = common::warc_response("https://x.jp/a", "text/html", "<p>本文</p>");
    data.extend(common::warc_response("https://x.jp/logo.png", "image/png", "PNG"));
    data.extend(common::warc_response("https://x.jp/b", "text/html", "<p>続報</p>"));
    fs::write(&archive, data).unwrap();
    let out = tmp.path().join("out.csv");

    let report = run(vec![archive], &out);
    assert_eq!(report.warc_records, 3);
    assert_eq!(report.records_read, 2);
    assert_eq!(report.retained, 2);
}
