use crate::infra::RegistrationFixture;
use clap::Args;
use procreg::config::AppConfig;
use procreg::error::AppError;
use procreg::registrations::{
    slugs, Actor, ActorRole, AnswerRequest, Blueprint, BlueprintConfig, BlueprintView,
    FieldValue, GroupType, MemoryRecordStore, ProgressCursor, ProgressItem, ProgressStatus,
    ProgressTracker, RecordId, RegistrationService, ReviewDecision, UserId,
};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Title of the sample registration.
    #[arg(long, default_value = "Reading habits of first-year students")]
    pub(crate) title: String,
    /// Stop after submission instead of recording a privacy officer decision.
    #[arg(long)]
    pub(crate) skip_review: bool,
    /// Return the registration to the applicant instead of approving it.
    #[arg(long)]
    pub(crate) reject: bool,
}

#[derive(Args, Debug)]
pub(crate) struct EvaluateArgs {
    /// JSON fixture holding a registration and its child rows
    #[arg(long)]
    pub(crate) fixture: PathBuf,
    /// Question slug to mark as current in the progress listing
    #[arg(long)]
    pub(crate) current: Option<String>,
    /// Print the full blueprint view as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

type Service = RegistrationService<MemoryRecordStore>;

pub(crate) fn run_evaluate(args: EvaluateArgs) -> Result<(), AppError> {
    let EvaluateArgs {
        fixture,
        current,
        json,
    } = args;

    let config = AppConfig::load()?;
    let store = Arc::new(MemoryRecordStore::new());
    let id = RegistrationFixture::load(&fixture)?.seed(&store)?;
    let service = RegistrationService::new(store, config.blueprint);

    let blueprint = service.blueprint(&reviewer(), id)?;
    let cursor = current.as_deref().map(|slug| ProgressCursor {
        slug,
        group_type: None,
    });

    if json {
        let view = BlueprintView::from_blueprint(&blueprint, cursor);
        match serde_json::to_string_pretty(&view) {
            Ok(json) => println!("{json}"),
            Err(err) => println!("Blueprint view unavailable: {err}"),
        }
    } else {
        render_blueprint(&blueprint, cursor);
    }
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        title,
        skip_review,
        reject,
    } = args;

    let service = RegistrationService::new(
        Arc::new(MemoryRecordStore::new()),
        BlueprintConfig::default(),
    );
    let applicant = Actor::applicant("researcher-17");

    println!("Research registration demo");
    let id = service.create(&applicant, &title)?;
    println!("- Created registration {id}: {title}");

    answer(&service, &applicant, id, slugs::FACULTY, vec![("faculty", "arts".into())])?;
    answer(
        &service,
        &applicant,
        id,
        slugs::TRAVERSAL,
        vec![
            ("date_start", "2025-02-01".into()),
            ("date_end", "2025-11-30".into()),
        ],
    )?;
    answer(
        &service,
        &applicant,
        id,
        slugs::GOAL,
        vec![("research_goal", "Compare reading time across cohorts".into())],
    )?;
    answer(
        &service,
        &applicant,
        id,
        slugs::INVOLVED_PEOPLE,
        vec![
            ("involves_knowingly", true.into()),
            ("involves_guardian", true.into()),
        ],
    )?;

    println!("\nAfter selecting the involved groups");
    render_blueprint(&service.blueprint(&applicant, id)?, None);

    describe_group(&service, &applicant, id, GroupType::Knowingly, "Students")?;
    describe_group(&service, &applicant, id, GroupType::Guardian, "Parents")?;

    answer(
        &service,
        &applicant,
        id,
        slugs::RETENTION,
        vec![
            ("raw_storage_location", "university_network_drive".into()),
            ("raw_data_decade", "one".into()),
            ("ic_storage_location", "research_data_platform".into()),
            ("ic_storage_decade", "one".into()),
            ("audio_video_kept", "no".into()),
        ],
    )?;
    answer(
        &service,
        &applicant,
        id,
        slugs::RECEIVERS,
        vec![("third_party_sharing", "yes".into())],
    )?;
    answer_entry(
        &service,
        &applicant,
        id,
        slugs::NEW_RECEIVER,
        None,
        vec![
            ("name", "Transcription bureau".into()),
            ("outside_eer", "no".into()),
        ],
    )?;
    answer(&service, &applicant, id, slugs::SOFTWARE, vec![("uses_software", "no".into())])?;
    answer(&service, &applicant, id, slugs::SECURITY, vec![("follows_policy", "yes".into())])?;
    answer(
        &service,
        &applicant,
        id,
        slugs::SUBMIT,
        vec![("confirm_submission", true.into())],
    )?;

    println!("\nAll questions answered");
    render_blueprint(&service.blueprint(&applicant, id)?, None);

    let status = service.submit(&applicant, id)?;
    println!("\n- Submitted for review -> status {}", status.label());
    if skip_review {
        return Ok(());
    }

    let decision = ReviewDecision {
        approved: !reject,
        comments: if reject {
            "Please describe how consent forms are stored".to_string()
        } else {
            String::new()
        },
    };
    let status = service.respond(&Actor::privacy_officer("privacy-desk"), id, decision)?;
    println!("- Privacy officer decision -> status {}", status.label());
    Ok(())
}

fn describe_group(
    service: &Service,
    actor: &Actor,
    id: RecordId,
    group: GroupType,
    name: &str,
) -> Result<(), AppError> {
    let outcome = service.answer(
        actor,
        id,
        AnswerRequest {
            slug: slugs::NEW_INVOLVED.to_string(),
            entry: None,
            group_type: Some(group),
            values: values(vec![("name", name.into())]),
        },
    )?;
    let Some(row) = outcome.entry else {
        println!("  {} rejected: {:?}", slugs::NEW_INVOLVED, outcome.errors);
        return Ok(());
    };

    let answers: [(&str, Vec<(&str, FieldValue)>); 4] = [
        (
            slugs::PURPOSE,
            vec![("process_purpose", "Survey about reading time".into())],
        ),
        (
            slugs::SPECIAL_DETAILS,
            vec![("provides_special_details", "no".into())],
        ),
        (
            slugs::SENSITIVE_DETAILS,
            vec![
                ("provides_criminal_information", false.into()),
                ("involves_children_under_15", (group == GroupType::Guardian).into()),
            ],
        ),
        (
            slugs::REGULAR_DETAILS,
            vec![
                (
                    "regular_details",
                    FieldValue::List(vec!["name".to_string(), "email".to_string()]),
                ),
                ("provides_ic_form", "yes".into()),
                ("ic_form_details", "Signed on paper, scanned to the project drive".into()),
            ],
        ),
    ];
    for (slug, pairs) in answers {
        answer_entry(service, actor, id, slug, Some(row), pairs)?;
    }
    println!("- Described group '{}' with entry {row}", group.label());
    Ok(())
}

fn answer(
    service: &Service,
    actor: &Actor,
    id: RecordId,
    slug: &str,
    pairs: Vec<(&str, FieldValue)>,
) -> Result<(), AppError> {
    answer_entry(service, actor, id, slug, None, pairs)
}

fn answer_entry(
    service: &Service,
    actor: &Actor,
    id: RecordId,
    slug: &str,
    entry: Option<RecordId>,
    pairs: Vec<(&str, FieldValue)>,
) -> Result<(), AppError> {
    let outcome = service.answer(
        actor,
        id,
        AnswerRequest {
            slug: slug.to_string(),
            entry,
            group_type: None,
            values: values(pairs),
        },
    )?;
    if outcome.saved {
        println!("  {slug} saved -> next {}", outcome.location);
    } else {
        for error in &outcome.errors {
            println!("  {slug} rejected: {} ({})", error.field, error.message);
        }
    }
    Ok(())
}

fn values(pairs: Vec<(&str, FieldValue)>) -> BTreeMap<String, FieldValue> {
    pairs
        .into_iter()
        .map(|(field, value)| (field.to_string(), value))
        .collect()
}

fn reviewer() -> Actor {
    Actor {
        user: UserId("cli".to_string()),
        role: ActorRole::Staff,
    }
}

pub(crate) fn render_blueprint(blueprint: &Blueprint, cursor: Option<ProgressCursor<'_>>) {
    let registration = blueprint.registration();
    println!(
        "Registration {}: {} [{}]",
        blueprint.registration_id(),
        registration.title,
        blueprint.status().label()
    );

    println!("Progress");
    for item in ProgressTracker::new(blueprint).items(cursor) {
        render_item(&item, 1);
    }

    if blueprint.errors().is_empty() {
        println!("Open issues: none");
    } else {
        println!("Open issues");
        for (slug, errors) in blueprint.errors().iter() {
            for error in errors {
                println!("- {slug}.{}: {}", error.field, error.message);
            }
        }
    }
    println!("Next: {}", blueprint.get_desired_next_url());
}

fn render_item(item: &ProgressItem, depth: usize) {
    let marker = match item.status {
        ProgressStatus::Complete => "[x]",
        ProgressStatus::Incomplete => "[ ]",
        ProgressStatus::Disabled => "[-]",
    };
    let number = item
        .number
        .map(|number| format!("{number}. "))
        .unwrap_or_default();
    let active = if item.active { "  <- current" } else { "" };
    println!(
        "{}{marker} {number}{}{active}",
        "  ".repeat(depth),
        item.title
    );
    for child in &item.children {
        render_item(child, depth + 1);
    }
}
