use chrono::{Duration, Utc};
use chrono_tz::Tz;
use clawstat::aggregation::{bucket_daily, group_by_provider, summarize_total};
use clawstat_core::types::{CostBreakdown, ISOTimestamp, SessionId, TokenCounts, UsageRecord};
use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

fn create_test_records(count: usize) -> Vec<UsageRecord> {
    let base_time = Utc::now();

    (0..count)
        .map(|i| {
            let hours_ago = (i / 10) as i64;
            UsageRecord {
                session_id: SessionId::new(format!("session-{}", i % 20)),
                timestamp: ISOTimestamp::new(base_time - Duration::hours(hours_ago)),
                provider: if i % 2 == 0 { "anthropic" } else { "openai" }.to_string(),
                model: if i % 3 == 0 { "claude-opus-4" } else { "gpt-5" }.to_string(),
                tokens: TokenCounts::new((i * 100) as u64, (i * 50) as u64, (i * 10) as u64, 0),
                total_tokens: (i * 160) as u64,
                cost: CostBreakdown {
                    total: (i as f64) * 0.001,
                    ..Default::default()
                },
            }
        })
        .collect()
}

fn benchmark_daily_buckets(c: &mut Criterion) {
    let mut group = c.benchmark_group("daily_buckets");
    let today = clawstat_core::timezone::TimezoneConfig::utc().date_of(&Utc::now());

    for size in [100, 10_000] {
        let records = create_test_records(size);
        group.bench_function(format!("window_7_{size}"), |b| {
            b.iter(|| bucket_daily(black_box(&records), Some(7), today, &Tz::UTC))
        });
        group.bench_function(format!("all_{size}"), |b| {
            b.iter(|| bucket_daily(black_box(&records), None, today, &Tz::UTC))
        });
    }

    group.finish();
}

fn benchmark_rollups(c: &mut Criterion) {
    let records = create_test_records(10_000);

    c.bench_function("provider_groups_10000", |b| {
        b.iter(|| group_by_provider(black_box(&records)))
    });
    c.bench_function("total_10000", |b| {
        b.iter(|| summarize_total(black_box(&records), &Tz::UTC))
    });
}

criterion_group!(benches, benchmark_daily_buckets, benchmark_rollups);
criterion_main!(benches);
