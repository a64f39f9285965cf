use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use feedwire::parser;
use feedwire::schema::{self, atom};
use feedwire::writer;

/// Generate a feed document with the given number of entries.
fn generate_feed(entries: usize) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom" xmlns:gd="http://schemas.google.com/g/2005">
  <id>urn:bench:feed</id>
  <title>Benchmark Feed</title>
  <updated>2008-09-15T09:00:00Z</updated>
"#,
    );

    for i in 0..entries {
        xml.push_str(&format!(
            r#"  <entry>
    <id>urn:bench:entry{i}</id>
    <title>Entry number {i}</title>
    <updated>2008-09-15T09:00:00Z</updated>
    <link rel="alternate" href="http://example.com/{i}"/>
    <category scheme="http://example.com/scheme" term="term{i}"/>
    <content>Body text for entry {i}.</content>
    <gd:when startTime="2008-09-16T10:00:00Z" endTime="2008-09-16T11:00:00Z"/>
  </entry>
"#
        ));
    }

    xml.push_str("</feed>\n");
    xml
}

fn benchmark_parse(c: &mut Criterion) {
    let registry = schema::registry();
    let mut group = c.benchmark_group("parse_feed");

    for entries in [10, 100, 1000] {
        let xml = generate_feed(entries);
        group.bench_with_input(
            BenchmarkId::from_parameter(entries),
            &xml,
            |b, xml| {
                b.iter(|| {
                    let feed =
                        parser::parse_str(black_box(xml), &registry, &atom::FEED).unwrap();
                    black_box(feed)
                })
            },
        );
    }

    group.finish();
}

fn benchmark_write(c: &mut Criterion) {
    let registry = schema::registry();
    let mut group = c.benchmark_group("write_feed");

    for entries in [10, 100, 1000] {
        let xml = generate_feed(entries);
        let feed = parser::parse_str(&xml, &registry, &atom::FEED).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(entries), &feed, |b, feed| {
            b.iter(|| black_box(writer::write_str(black_box(feed)).unwrap()))
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_parse, benchmark_write);
criterion_main!(benches);
