//! Command dispatch: one handler per subcommand.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::CommandFactory;
use clap_complete::{generate, Shell};
use itertools::Itertools;
use tracing::{debug, instrument};

use crate::application::services::report::ReportItem;
use crate::application::services::{export_to_json_string, TextReportRenderer};
use crate::application::{ApplicationError, FlowchartStore, MutationOutcome};
use crate::cli::args::{
    Branch, CategoryCommands, Cli, Commands, ConfigCommands, NodeCommands, RecCommands,
};
use crate::cli::error::{CliError, CliResult};
use crate::cli::flow_tree::flow_tree;
use crate::cli::output;
use crate::config::{global_config_path, Settings};
use crate::domain::catalog::category_label;
use crate::domain::ids::{
    generate_node_id, recommendation_id_from_text, validate_node_id, validate_recommendation_id,
};
use crate::domain::integrity;
use crate::domain::{
    try_next_step, NodePatch, QuestionNode, RecommendationEntry, RecommendationPatch, Step,
    SurveySession,
};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::traits::{ScriptedSelector, SelectionItem, Selector};
use crate::infrastructure::InfraError;
use crate::util::path::absolutize;

/// Load settings and run the parsed command.
pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let settings = Settings::load(cli.config.as_deref())?;
    debug!("settings: {:?}", settings);
    match &cli.command {
        Commands::Config { command } => _config(command, &settings, cli.config.as_deref()),
        Commands::Completion { shell } => _completion(*shell),
        command => execute_with(command, &ServiceContainer::new(settings)),
    }
}

/// Run a flowchart command against the collaborators in `container`.
pub fn execute_with(command: &Commands, container: &ServiceContainer) -> CliResult<()> {
    match command {
        Commands::Categories => _categories(container),
        Commands::Category { command } => match command {
            CategoryCommands::Add { name } => _category_add(container, name),
            CategoryCommands::Delete { name } => _category_delete(container, name),
        },
        Commands::Node { command } => _node(container, command),
        Commands::Rec { command } => _rec(container, command),
        Commands::Step {
            category,
            node,
            answer,
            json,
        } => _step(container, category, node, answer, *json),
        Commands::Survey {
            category,
            answers,
            school,
            report,
            report_dir,
        } => _survey(
            container,
            category,
            answers.as_deref(),
            school.as_deref(),
            *report,
            report_dir.as_deref(),
        ),
        Commands::Export { dir, stdout } => _export(container, dir.as_deref(), *stdout),
        Commands::Import { file } => _import(container, file),
        Commands::Check => _check(container),
        Commands::Reset => _reset(container),
        Commands::Config { command } => _config(command, &container.settings, None),
        Commands::Completion { shell } => _completion(*shell),
    }
}

/// Persist an applied mutation; map the other outcomes to errors about `what`.
fn commit(
    container: &ServiceContainer,
    store: &FlowchartStore,
    outcome: MutationOutcome,
    what: &str,
) -> CliResult<()> {
    match outcome {
        MutationOutcome::Applied => {
            container.persistence().try_save(store.data())?;
            Ok(())
        }
        MutationOutcome::NotFound => Err(CliError::NotFound(what.to_string())),
        MutationOutcome::AlreadyExists => {
            Err(CliError::InvalidArgs(format!("{} already exists", what)))
        }
        MutationOutcome::Rejected => Err(CliError::InvalidArgs(format!("{} is not allowed", what))),
    }
}

#[instrument(skip(container))]
fn _categories(container: &ServiceContainer) -> CliResult<()> {
    let store = container.open_store()?;
    let data = store.data();
    for (name, nodes) in &data.categories {
        output::info(&format!(
            "{:<20} {:<28} {} questions",
            name,
            category_label(name),
            nodes.len()
        ));
    }
    output::detail(&format!("{} recommendations", data.recommendations.len()));
    Ok(())
}

#[instrument(skip(container))]
fn _category_add(container: &ServiceContainer, name: &str) -> CliResult<()> {
    let mut store = container.open_store()?;
    let outcome = store.add_category(name);
    commit(container, &store, outcome, &format!("category '{}'", name))?;
    output::success(&format!("Added category {}", name));
    Ok(())
}

#[instrument(skip(container))]
fn _category_delete(container: &ServiceContainer, name: &str) -> CliResult<()> {
    let mut store = container.open_store()?;
    let outcome = store.delete_category(name);
    commit(container, &store, outcome, &format!("category '{}'", name))?;
    output::success(&format!("Deleted category {}", name));
    Ok(())
}

fn _node(container: &ServiceContainer, command: &NodeCommands) -> CliResult<()> {
    match command {
        NodeCommands::List { category } => _node_list(container, category),
        NodeCommands::Show { category, id } => _node_show(container, category, id),
        NodeCommands::Tree { category } => _node_tree(container, category),
        NodeCommands::Add {
            category,
            id,
            text,
            next,
        } => _node_add(container, category, id.as_deref(), text, next),
        NodeCommands::Update {
            category,
            id,
            text,
            next,
            remove_answer,
        } => _node_update(container, category, id, text.as_deref(), next, remove_answer),
        NodeCommands::Delete { category, id } => _node_delete(container, category, id),
    }
}

#[instrument(skip(container))]
fn _node_list(container: &ServiceContainer, category: &str) -> CliResult<()> {
    let store = container.open_store()?;
    let nodes = store
        .data()
        .category(category)
        .ok_or_else(|| CliError::NotFound(format!("category '{}'", category)))?;
    for node in nodes {
        output::info(&format!("{:<12} {}", node.id, node.text));
        output::detail(&format!("answers: {}", node.answers().join(", ")));
    }
    Ok(())
}

#[instrument(skip(container))]
fn _node_show(container: &ServiceContainer, category: &str, id: &str) -> CliResult<()> {
    let store = container.open_store()?;
    let node = store
        .data()
        .find_node(category, id)
        .ok_or_else(|| CliError::NotFound(format!("question '{}' in '{}'", id, category)))?;
    output::info(&to_pretty_json(node)?);
    Ok(())
}

#[instrument(skip(container))]
fn _node_tree(container: &ServiceContainer, category: &str) -> CliResult<()> {
    let store = container.open_store()?;
    let tree = flow_tree(store.data(), category)
        .ok_or_else(|| CliError::NotFound(format!("questions in category '{}'", category)))?;
    output::info(&tree);
    Ok(())
}

#[instrument(skip(container, next))]
fn _node_add(
    container: &ServiceContainer,
    category: &str,
    id: Option<&str>,
    text: &str,
    next: &[Branch],
) -> CliResult<()> {
    let mut store = container.open_store()?;
    let id = match id {
        Some(id) => {
            validate_node_id(id).map_err(ApplicationError::from)?;
            id.to_string()
        }
        None => generate_node_id(category),
    };
    if store.data().find_node(category, &id).is_some() {
        return Err(CliError::InvalidArgs(format!(
            "question '{}' already exists in '{}'",
            id, category
        )));
    }

    let node = next
        .iter()
        .fold(QuestionNode::new(id.as_str(), text), |node, branch| {
            node.with_answer(branch.answer.as_str(), branch.next.clone())
        });
    let outcome = store.add_node(category, node);
    commit(container, &store, outcome, &format!("category '{}'", category))?;
    output::success(&format!("Added question {} to {}", id, category));
    Ok(())
}

/// Read-modify-write of the branch map; other fields merge shallowly.
#[instrument(skip(container, next))]
fn _node_update(
    container: &ServiceContainer,
    category: &str,
    id: &str,
    text: Option<&str>,
    next: &[Branch],
    remove_answer: &[String],
) -> CliResult<()> {
    let mut store = container.open_store()?;
    let current = store
        .data()
        .find_node(category, id)
        .ok_or_else(|| CliError::NotFound(format!("question '{}' in '{}'", id, category)))?;

    let mut patch = NodePatch {
        text: text.map(str::to_string),
        ..NodePatch::default()
    };
    if !next.is_empty() || !remove_answer.is_empty() {
        let mut branches = current.next.clone();
        for answer in remove_answer {
            if branches.shift_remove(answer).is_none() {
                output::warning(&format!("no branch for answer '{}'", answer));
            }
        }
        for branch in next {
            branches.insert(branch.answer.clone(), branch.next.clone());
        }
        patch.next = Some(branches);
    }
    if patch.is_empty() {
        return Err(CliError::Usage(
            "nothing to update: give --text, --next or --remove-answer".to_string(),
        ));
    }

    let outcome = store.update_node(category, id, patch);
    commit(
        container,
        &store,
        outcome,
        &format!("question '{}' in '{}'", id, category),
    )?;
    output::success(&format!("Updated question {}", id));
    Ok(())
}

#[instrument(skip(container))]
fn _node_delete(container: &ServiceContainer, category: &str, id: &str) -> CliResult<()> {
    let mut store = container.open_store()?;
    let outcome = store.delete_node(category, id);
    commit(
        container,
        &store,
        outcome,
        &format!("question '{}' in '{}'", id, category),
    )?;
    output::success(&format!("Deleted question {}", id));
    Ok(())
}

fn _rec(container: &ServiceContainer, command: &RecCommands) -> CliResult<()> {
    match command {
        RecCommands::List => _rec_list(container),
        RecCommands::Add { id, text, icon } => {
            _rec_add(container, id.as_deref(), text, icon.as_deref())
        }
        RecCommands::Update { id, text, icon } => {
            _rec_update(container, id, text.as_deref(), icon.as_deref())
        }
        RecCommands::Delete { id } => _rec_delete(container, id),
    }
}

#[instrument(skip(container))]
fn _rec_list(container: &ServiceContainer) -> CliResult<()> {
    let store = container.open_store()?;
    for (id, entry) in &store.data().recommendations {
        output::info(&format!(
            "{:<24} {} {}",
            id,
            entry.icon.as_deref().unwrap_or(" "),
            entry.text
        ));
    }
    Ok(())
}

#[instrument(skip(container))]
fn _rec_add(
    container: &ServiceContainer,
    id: Option<&str>,
    text: &str,
    icon: Option<&str>,
) -> CliResult<()> {
    let mut store = container.open_store()?;
    let id = match id {
        Some(id) => id.to_string(),
        None => recommendation_id_from_text(text),
    };
    validate_recommendation_id(&id).map_err(ApplicationError::from)?;
    if store.data().recommendation(&id).is_some() {
        return Err(CliError::InvalidArgs(format!(
            "recommendation '{}' already exists",
            id
        )));
    }

    let mut entry = RecommendationEntry::new(text);
    if let Some(icon) = icon {
        entry = entry.with_icon(icon);
    }
    let outcome = store.add_recommendation(&id, entry);
    commit(container, &store, outcome, &format!("recommendation '{}'", id))?;
    output::success(&format!("Added recommendation {}", id));
    Ok(())
}

#[instrument(skip(container))]
fn _rec_update(
    container: &ServiceContainer,
    id: &str,
    text: Option<&str>,
    icon: Option<&str>,
) -> CliResult<()> {
    if text.is_none() && icon.is_none() {
        return Err(CliError::Usage(
            "nothing to update: give --text or --icon".to_string(),
        ));
    }
    let mut store = container.open_store()?;
    let patch = RecommendationPatch {
        text: text.map(str::to_string),
        icon: icon.map(str::to_string),
        ..RecommendationPatch::default()
    };
    let outcome = store.update_recommendation(id, patch);
    commit(container, &store, outcome, &format!("recommendation '{}'", id))?;
    output::success(&format!("Updated recommendation {}", id));
    Ok(())
}

#[instrument(skip(container))]
fn _rec_delete(container: &ServiceContainer, id: &str) -> CliResult<()> {
    let mut store = container.open_store()?;
    let outcome = store.delete_recommendation(id);
    commit(container, &store, outcome, &format!("recommendation '{}'", id))?;
    output::success(&format!("Deleted recommendation {}", id));
    Ok(())
}

#[instrument(skip(container))]
fn _step(
    container: &ServiceContainer,
    category: &str,
    node: &str,
    answer: &str,
    json: bool,
) -> CliResult<()> {
    let store = container.open_store()?;
    let step = try_next_step(store.data(), category, node, answer)
        .map_err(|e| CliError::NotFound(e.to_string()))?;
    if json {
        output::info(&to_pretty_json(&step)?);
        return Ok(());
    }
    print_step(&step);
    Ok(())
}

fn print_step(step: &Step<'_>) {
    match step {
        Step::Question(node) => output::action("question", &format!("{} {}", node.id, node.text)),
        Step::Recommendation(rec) => output::action(
            "recommendation",
            &format!(
                "{} {} {}",
                rec.id,
                rec.entry.icon.as_deref().unwrap_or(""),
                rec.entry.text
            ),
        ),
        Step::End => output::action("end", "survey complete"),
    }
}

#[instrument(skip(container, answers))]
fn _survey(
    container: &ServiceContainer,
    category: &str,
    answers: Option<&[String]>,
    school: Option<&str>,
    report: bool,
    report_dir: Option<&Path>,
) -> CliResult<()> {
    let store = container.open_store()?;
    let data = store.data();
    let selector: Arc<dyn Selector> = match answers {
        Some(answers) => Arc::new(ScriptedSelector::new(answers.iter().cloned())),
        None => container.selector.clone(),
    };

    let mut session = SurveySession::start(data, category).map_err(ApplicationError::from)?;
    output::header(&category_label(category));

    while let Some(question) = session.current_question(data) {
        output::info(&question.text);
        let items: Vec<SelectionItem> = question
            .answers()
            .map(|answer| SelectionItem {
                display: answer.to_string(),
                value: answer.to_string(),
            })
            .collect();
        if items.is_empty() {
            output::warning(&format!("question {} has no answers", question.id));
            break;
        }
        let choice = selector
            .select_one(&items, &format!("{} > ", question.id))
            .map_err(|message| InfraError::Selector { message })?;
        let Some(choice) = choice else {
            output::warning("survey cancelled");
            return Ok(());
        };
        output::detail(&format!("-> {}", choice.value));

        let step = session
            .answer(data, &choice.value)
            .map_err(ApplicationError::from)?;
        if let Step::Recommendation(rec) = step {
            output::success_detail(&format!(
                "{} {}",
                rec.entry.icon.as_deref().unwrap_or(""),
                rec.entry.text
            ));
        }
    }

    let collected = session.recommendations(data);
    output::header("Recommended Interventions:");
    if collected.is_empty() {
        output::detail("none");
    }
    for (i, (_, entry)) in collected.iter().enumerate() {
        output::detail(&format!(
            "{}. {} {}",
            i + 1,
            entry.icon.as_deref().unwrap_or(""),
            entry.text
        ));
    }

    if report {
        let items: Vec<ReportItem> = collected.iter().map(|(_, entry)| (*entry).into()).collect();
        let school = school.or(container.settings.school_name.as_deref());
        let dir = report_dir.unwrap_or(container.settings.report_dir.as_path());
        let path = container
            .report(Arc::new(TextReportRenderer))
            .save(&items, category, school, dir)?;
        output::action("Report", &path.display());
    }
    Ok(())
}

#[instrument(skip(container))]
fn _export(container: &ServiceContainer, dir: Option<&Path>, stdout: bool) -> CliResult<()> {
    let store = container.open_store()?;
    let interchange = container.interchange();
    if stdout {
        output::info(&export_to_json_string(store.data())?);
        return Ok(());
    }
    let dir: PathBuf = match dir {
        Some(dir) => dir.to_path_buf(),
        None => absolutize(Path::new("."))
            .map_err(|e| InfraError::io("resolve current directory", e))?,
    };
    interchange.export_flowchart(&store, &dir)?;
    output::action("Exported", &interchange.export_path(&dir).display());
    Ok(())
}

#[instrument(skip(container))]
fn _import(container: &ServiceContainer, file: &Path) -> CliResult<()> {
    let mut store = container.open_store()?;
    let data = container.interchange().import_file(file)?;
    let report = integrity::check(&data);
    store.replace(data);
    container.persistence().try_save(store.data())?;
    output::success(&format!("Imported {}", file.display()));
    if !report.is_clean() {
        output::warning("imported data has integrity problems; run `cribs check`");
    }
    Ok(())
}

#[instrument(skip(container))]
fn _check(container: &ServiceContainer) -> CliResult<()> {
    let store = container.open_store()?;
    let report = integrity::check(store.data());
    if report.is_clean() {
        output::success("No problems found");
        return Ok(());
    }
    for d in &report.dangling {
        output::failure(&format!(
            "{}/{} [{}] -> {}: dangling reference",
            d.category, d.node_id, d.answer, d.target
        ));
    }
    for d in &report.duplicates {
        output::failure(&format!("{}/{}: duplicate id", d.category, d.node_id));
    }
    for c in &report.cycles {
        output::failure(&format!("{}: cycle {}", c.category, c.path.join(" -> ")));
    }
    Err(CliError::Integrity(format!(
        "{} dangling, {} duplicate, {} cycles",
        report.dangling.len(),
        report.duplicates.len(),
        report.cycles.len()
    )))
}

#[instrument(skip(container))]
fn _reset(container: &ServiceContainer) -> CliResult<()> {
    let persistence = container.persistence();
    if !persistence.clear_saved() {
        return Err(CliError::Infra(InfraError::Application(
            ApplicationError::OperationFailed {
                context: format!("clear saved flowchart '{}'", persistence.key()),
                source: "storage unavailable".into(),
            },
        )));
    }
    output::success("Saved working copy discarded");
    Ok(())
}

fn _config(command: &ConfigCommands, settings: &Settings, local: Option<&Path>) -> CliResult<()> {
    match command {
        ConfigCommands::Show => output::info(&settings.to_toml()?),
        ConfigCommands::Template => output::info(&Settings::template()),
        ConfigCommands::Path => {
            match global_config_path() {
                Some(path) => output::action("global", &path.display()),
                None => output::action("global", "(no config directory)"),
            }
            if let Some(local) = local {
                output::action("local", &local.display());
            }
            output::action("storage", &settings.storage_dir().display());
        }
    }
    Ok(())
}

fn _completion(shell: Shell) -> CliResult<()> {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
    Ok(())
}

fn to_pretty_json<T: serde::Serialize + ?Sized>(value: &T) -> CliResult<String> {
    serde_json::to_string_pretty(value).map_err(|e| {
        ApplicationError::OperationFailed {
            context: "serialize to JSON".to_string(),
            source: Box::new(e),
        }
        .into()
    })
}
