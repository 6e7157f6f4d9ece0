//! Interactive browsing: the results screen as a prompt loop.

use anyhow::Result;
use dialoguer::{Input, Select};
use turbo_search::{LoadOutcome, SearchError, SearchSession, SearchState};

use super::search::render;
use super::BrowseArgs;
use crate::context::Context;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    LoadMore,
    LoadPrevious,
    RetryFailed,
    Refine,
    Sort,
    Query,
    ClearAll,
    Quit,
}

impl Action {
    fn label(self) -> &'static str {
        match self {
            Action::LoadMore => "Load more",
            Action::LoadPrevious => "Load previous",
            Action::RetryFailed => "Retry failed page",
            Action::Refine => "Toggle a filter",
            Action::Sort => "Change sort",
            Action::Query => "Search text",
            Action::ClearAll => "Clear all filters",
            Action::Quit => "Quit",
        }
    }
}

/// Run the browse command.
pub async fn run(args: BrowseArgs, ctx: &Context) -> Result<()> {
    let state = SearchState {
        query: args.query.filter(|q| !q.trim().is_empty()),
        ..SearchState::default()
    };
    let session = ctx.session(state)?;
    load(ctx, &session, session.load_next()).await;

    loop {
        let snapshot = session.snapshot();
        render(ctx, &snapshot);

        let actions = available_actions(
            snapshot.has_more,
            snapshot.has_previous,
            !snapshot.errors.is_empty(),
            !snapshot.filters.groups.is_empty(),
            !snapshot.filters.sort_options.is_empty(),
            snapshot.filters.has_active_filters() || snapshot.parameters.query.is_some(),
        );
        let labels: Vec<&str> = actions.iter().map(|a| a.label()).collect();
        let choice = Select::new()
            .with_prompt("What next?")
            .items(&labels)
            .default(0)
            .interact()?;

        match actions[choice] {
            Action::LoadMore => load(ctx, &session, session.load_next()).await,
            Action::LoadPrevious => load(ctx, &session, session.load_previous()).await,
            Action::RetryFailed => load(ctx, &session, session.retry_failed()).await,
            Action::Refine => {
                if refine(&session)? {
                    load(ctx, &session, session.load_next()).await;
                }
            }
            Action::Sort => {
                if sort(&session)? {
                    load(ctx, &session, session.load_next()).await;
                }
            }
            Action::Query => {
                let text: String = Input::new()
                    .with_prompt("Search")
                    .allow_empty(true)
                    .interact_text()?;
                if session.set_query(Some(&text)).is_some() {
                    load(ctx, &session, session.load_next()).await;
                }
            }
            Action::ClearAll => {
                if session.clear_all().is_some() {
                    load(ctx, &session, session.load_next()).await;
                }
            }
            Action::Quit => break,
        }
    }

    Ok(())
}

fn available_actions(
    has_more: bool,
    has_previous: bool,
    has_errors: bool,
    has_refinements: bool,
    has_sorts: bool,
    can_clear: bool,
) -> Vec<Action> {
    let mut actions = Vec::new();
    if has_more {
        actions.push(Action::LoadMore);
    }
    if has_previous {
        actions.push(Action::LoadPrevious);
    }
    if has_errors {
        actions.push(Action::RetryFailed);
    }
    if has_refinements {
        actions.push(Action::Refine);
    }
    if has_sorts {
        actions.push(Action::Sort);
    }
    actions.push(Action::Query);
    if can_clear {
        actions.push(Action::ClearAll);
    }
    actions.push(Action::Quit);
    actions
}

async fn load<F>(ctx: &Context, session: &SearchSession, fut: F)
where
    F: std::future::Future<Output = Result<LoadOutcome, SearchError>>,
{
    let spinner = ctx.output.spinner("Loading...");
    let result = fut.await;
    spinner.finish_and_clear();

    match result {
        Ok(LoadOutcome::Loaded { offset, status }) => {
            ctx.output
                .debug(&format!("offset {} loaded ({})", offset, status));
        }
        Ok(LoadOutcome::Skipped) => {}
        Err(e) if !e.is_user_visible() => {}
        Err(e) => ctx.output.warn(&format!(
            "{} ({} product(s) still shown)",
            e,
            session.snapshot().items.len()
        )),
    }
}

fn refine(session: &SearchSession) -> Result<bool> {
    let filters = session.presentation();
    let groups: Vec<String> = filters
        .groups
        .iter()
        .map(|g| match g.selected_count() {
            0 => g.label.clone(),
            n => format!("{} ({} selected)", g.label, n),
        })
        .collect();
    let Some(group) = Select::new()
        .with_prompt("Filter")
        .items(&groups)
        .default(0)
        .interact_opt()?
    else {
        return Ok(false);
    };
    let group = &filters.groups[group];

    let values: Vec<String> = group
        .values
        .iter()
        .map(|v| {
            let mark = if v.selected { "☑" } else { "☐" };
            format!("{} {} ({})", mark, v.label, v.hit_count)
        })
        .collect();
    let Some(value) = Select::new()
        .with_prompt(group.label.as_str())
        .items(&values)
        .default(0)
        .interact_opt()?
    else {
        return Ok(false);
    };

    session.toggle_refinement(group.attribute_id.clone(), group.values[value].value.clone());
    Ok(true)
}

fn sort(session: &SearchSession) -> Result<bool> {
    let filters = session.presentation();
    let labels: Vec<&str> = filters
        .sort_options
        .iter()
        .map(|s| s.label.as_str())
        .collect();
    let current = filters
        .sort_options
        .iter()
        .position(|s| s.selected)
        .unwrap_or(0);
    let Some(choice) = Select::new()
        .with_prompt("Sort by")
        .items(&labels)
        .default(current)
        .interact_opt()?
    else {
        return Ok(false);
    };

    session.set_sort(filters.sort_options[choice].id.clone());
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actions_for_first_empty_screen() {
        let actions = available_actions(false, false, false, false, false, false);
        assert_eq!(actions, vec![Action::Query, Action::Quit]);
    }

    #[test]
    fn test_actions_with_results_and_failure() {
        let actions = available_actions(true, false, true, true, true, true);
        assert_eq!(actions.first(), Some(&Action::LoadMore));
        assert!(actions.contains(&Action::RetryFailed));
        assert!(actions.contains(&Action::ClearAll));
        assert!(!actions.contains(&Action::LoadPrevious));
        assert_eq!(actions.last(), Some(&Action::Quit));
    }
}
