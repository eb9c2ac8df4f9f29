use crate::infra::{
    default_settings, InMemoryMetricsStore, InMemoryReputationLedger, InMemoryTierAlertPublisher,
};
use clap::Args;
use std::sync::Arc;

use habita::error::AppError;
use habita::workflows::reputation::{
    replayed_score, AdvisorId, ApplyOutcome, EventSubmission, ReputationLedger, ReputationService,
};

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Advisor identifier used throughout the walkthrough
    #[arg(long, default_value = "adv-1001")]
    pub(crate) advisor: String,
    /// Skip the penalty/demotion portion of the walkthrough
    #[arg(long)]
    pub(crate) skip_penalties: bool,
}

fn render(step: &str, outcome: &ApplyOutcome) {
    let marker = if outcome.tier_changed { " <- tier changed" } else { "" };
    println!(
        "  {step:<42} score {:>6}  tier {}{marker}",
        outcome.score,
        outcome.tier.label(),
    );
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        advisor,
        skip_penalties,
    } = args;

    let ledger = Arc::new(InMemoryReputationLedger::default());
    let metrics = Arc::new(InMemoryMetricsStore::default());
    let alerts = Arc::new(InMemoryTierAlertPublisher::default());
    let service = ReputationService::new(
        ledger.clone(),
        metrics,
        alerts.clone(),
        default_settings(),
    );

    let submit = |kind: &str, reason: &str, key: &str| EventSubmission {
        advisor_id: AdvisorId(advisor.clone()),
        event_kind: kind.to_string(),
        reason: reason.to_string(),
        idempotency_key: key.to_string(),
    };

    println!("Advisor reputation walkthrough for {advisor}");

    println!("\nClosing sales:");
    for n in 1..=5 {
        let outcome = service.apply(
            submit(
                "sale_closed",
                "sale closed via listing workflow",
                &format!("sale-{n}"),
            ),
            None,
        )?;
        render(&format!("sale_closed (sale-{n})"), &outcome);
    }

    println!("\nRetrying an already-processed transaction:");
    let replay = service.apply(
        submit("sale_closed", "duplicate delivery of sale-5", "sale-5"),
        None,
    )?;
    render("sale_closed (sale-5, retried)", &replay);

    println!("\nService signals:");
    for n in 1..=3 {
        let outcome = service.apply(
            submit(
                "review_five_star",
                "five-star review from a verified buyer",
                &format!("review-{n}"),
            ),
            None,
        )?;
        render(&format!("review_five_star (review-{n})"), &outcome);
    }
    let outcome = service.apply(
        submit("fast_response", "responded within five minutes", "fast-1"),
        None,
    )?;
    render("fast_response (fast-1)", &outcome);

    if !skip_penalties {
        println!("\nPenalties:");
        let outcome = service.apply(
            submit("no_show", "missed a confirmed viewing", "noshow-1"),
            None,
        )?;
        render("no_show (noshow-1)", &outcome);

        let outcome = service.apply(
            submit(
                "leak_attempt",
                "shared seller contact off-platform",
                "policy-1",
            ),
            None,
        )?;
        render("leak_attempt (policy-1)", &outcome);
    }

    let advisor_id = AdvisorId(advisor.clone());

    println!("\nRecent activity (newest first):");
    for event in service.activity(&advisor_id, 5)? {
        println!(
            "  {:<18} {:>6}  {}",
            event.kind.label(),
            event.points_delta,
            event.reason
        );
    }

    println!("\nTier alerts published:");
    let published = alerts.events();
    if published.is_empty() {
        println!("  (none)");
    }
    for alert in published {
        let direction = if alert.is_promotion() {
            "promotion"
        } else {
            "demotion"
        };
        println!(
            "  {direction}: {} -> {} at score {}",
            alert.previous_tier.label(),
            alert.new_tier.label(),
            alert.score
        );
    }

    let standing = service.metrics(&advisor_id)?;
    let history = ledger
        .replay(&advisor_id)
        .map_err(habita::workflows::reputation::ReputationError::from)?;
    println!(
        "\nLedger check: {} events sum to {}, aggregate holds {} ({})",
        history.len(),
        replayed_score(&history),
        standing.current_score,
        standing.current_tier.label()
    );

    Ok(())
}
