use crate::infra::{build_services, InMemoryStore, Services};
use clap::Args;
use reliablenet::badges::{definition, BadgeId, RecomputeOutcome};
use reliablenet::complexes::{ComplexId, IspMetric, NewComplex, NewIspLink, SpeedTestSample};
use reliablenet::config::{BadgeConfig, RecomputeMode};
use reliablenet::error::AppError;
use reliablenet::reviews::{PeakHourReport, ReviewSubmission, UserId};
use reliablenet::store::Store;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Print the final recompute payload as JSON.
    #[arg(long)]
    pub(crate) json: bool,
    /// Stop before the degraded speed test is recorded.
    #[arg(long)]
    pub(crate) skip_speed_test: bool,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<RecomputeOutcome, AppError> {
    let DemoArgs {
        json,
        skip_speed_test,
    } = args;

    let store = Arc::new(InMemoryStore::default());
    let config = BadgeConfig {
        recompute_mode: RecomputeMode::Inline,
        queue_depth: 1,
    };
    let (services, _) = build_services(store, &config);
    let resident = UserId("demo-resident".to_string());
    let moderator = UserId("demo-moderator".to_string());

    println!("ReliableNet badge demo");

    let complex = services.complexes.create(demo_complex())?;
    println!(
        "- Registered {} ({}) with amenities {:?}",
        complex.name, complex.id, complex.amenities
    );

    services.complexes.attach_isp(&complex.id, demo_isp())?;
    println!("- Attached MetroFiber: 150 down / 25 up / 15 ms, 98% reliable");
    print_badges("  Badges after ISP attach", &stored_badges(&services, &complex.id)?);

    let review = services
        .reviews
        .submit(&complex.id, &resident, demo_review())?;
    println!("- Resident review {} submitted (unverified)", review.id);
    print_badges("  Badges before moderation", &stored_badges(&services, &complex.id)?);

    services.reviews.verify(&review.id, &moderator)?;
    println!("- Review {} verified by {}", review.id, moderator);
    print_badges("  Badges after verification", &stored_badges(&services, &complex.id)?);

    let computation = services.badges.compute(&complex.id)?;
    println!("\nCriteria breakdown");
    for assessment in services
        .badges
        .evaluator()
        .assess(&computation.metrics, &complex.amenities)
    {
        let name = definition(assessment.badge).name;
        if assessment.qualified {
            println!("- {name}: earned");
        } else {
            println!("- {name}: not earned ({})", assessment.unmet.join("; "));
        }
    }

    match services.reviews.peak_hour_summary(&complex.id)? {
        Some(summary) => println!(
            "\nPeak hours: {} report(s), avg {:.1}/5 ({}), typical window {}:00-{}:00",
            summary.sample_count,
            summary.average_rating,
            summary.tier.label(),
            summary.typical_start_hour.unwrap_or_default(),
            summary.typical_end_hour.unwrap_or_default()
        ),
        None => println!("\nPeak hours: no reports"),
    }

    if !skip_speed_test {
        let sample = SpeedTestSample {
            isp: "MetroFiber".to_string(),
            download_speed: 50.0,
            upload_speed: 5.0,
            ping: 45.0,
        };
        let link = services.complexes.record_speed_test(&complex.id, sample)?;
        println!(
            "\n- Congested speed test recorded; MetroFiber now averages {:.0} down / {:.0} up / {:.0} ms",
            link.metric.avg_download, link.metric.avg_upload, link.metric.avg_ping
        );
        print_badges(
            "  Badges after speed test",
            &stored_badges(&services, &complex.id)?,
        );
    }

    let outcome = services.badges.recompute(&complex.id)?;
    render_outcome(&outcome, json);

    Ok(outcome)
}

fn stored_badges<S: Store>(
    services: &Services<S>,
    complex_id: &ComplexId,
) -> Result<Vec<BadgeId>, AppError> {
    Ok(services.complexes.get(complex_id)?.complex.badges)
}

fn print_badges(label: &str, badges: &[BadgeId]) {
    if badges.is_empty() {
        println!("{label}: none");
    } else {
        let names: Vec<&str> = badges.iter().map(|badge| definition(*badge).name).collect();
        println!("{label}: {}", names.join(", "));
    }
}

fn render_outcome(outcome: &RecomputeOutcome, json: bool) {
    if json {
        match serde_json::to_string_pretty(outcome) {
            Ok(payload) => println!("\nRecompute payload:\n{payload}"),
            Err(err) => println!("\nRecompute payload unavailable: {err}"),
        }
        return;
    }

    println!(
        "\nFinal recompute: {} verified review(s), persisted={}",
        outcome.metrics.verified_review_count, outcome.persisted
    );
    if let Some(best) = &outcome.metrics.best_isp {
        println!(
            "Best ISP: {} (composite score {:.1})",
            best.isp, best.composite_score
        );
    }
    print_badges("Badges", &outcome.badges);
}

fn demo_complex() -> NewComplex {
    NewComplex {
        name: "Lamar Union Lofts".to_string(),
        address: "1100 S Lamar Blvd".to_string(),
        city: "Austin".to_string(),
        state: "TX".to_string(),
        zip: "78704".to_string(),
        latitude: Some(30.2554),
        longitude: Some(-97.7627),
        website: None,
        amenities: vec!["Fiber Ready".to_string(), "Coworking Lounge".to_string()],
    }
}

fn demo_isp() -> NewIspLink {
    NewIspLink {
        isp: "MetroFiber".to_string(),
        coverage: 1.0,
        is_default: true,
        metric: IspMetric {
            avg_download: 150.0,
            avg_upload: 25.0,
            avg_ping: 15.0,
            reliability: Some(0.98),
            test_count: 1,
        },
    }
}

fn demo_review() -> ReviewSubmission {
    ReviewSubmission {
        rating: 5,
        internet_rating: 5,
        comment: Some("Video calls hold up even at 8pm".to_string()),
        pros: vec!["Symmetric-feeling uploads".to_string()],
        cons: Vec::new(),
        peak_hour: Some(PeakHourReport {
            rating: 5,
            start_hour: 19,
            end_hour: 22,
            download_speed: 120.0,
            upload_speed: 22.0,
            ping: 10.0,
            packet_loss: 0.1,
            comment: None,
        }),
    }
}
