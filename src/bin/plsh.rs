// plsh: Path-Loom Shell (explore an attack-path API from the terminal)
// Build with: cargo build --features cli --bin plsh

use clap::{Arg, ArgAction, Command};
use rustyline::Editor;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;

use path_loom::api::client::HttpGraphApi;
use path_loom::api::query::GraphOutcome;
use path_loom::api::types::Node;
use path_loom::graph_utils::colors::percent_to_title;
use path_loom::graph_utils::layered::RankDir;
use path_loom::persistence::settings::AppSettings;
use path_loom::search::filters::{
    CheckState, category_state, enabled_edge_types, set_category_checked, set_edge_type_checked, toggle_edge_type,
};
use path_loom::search::state::{SearchAction, SearchTab, SearchType, SlotId};
use path_loom::session::explore::ExploreSession;

type Session = ExploreSession<HttpGraphApi>;

const HELP: &str = "Commands:
  find <term>              Lookahead search, lists numbered matches
  from <n|term>            Select the start node (match number or search term)
  to <n|term>              Select the end node; runs pathfinding when both are set
  swap                     Swap start and end, then re-run pathfinding
  search                   Re-run the start node search
  path                     Re-run pathfinding
  cypher [query]           Run a Cypher query (or the last one)
  tab <search|pathfinding|cypher>
  filter [list]            Show edge filter categories
  filter on|off <kind|category>
  filter toggle <kind>
  type <exact|fuzzy>       Lookahead search type
  layout <TB|BT|LR|RL>     Re-run the layout in a new direction
  show                     Print the current graph
  export                   Write the last response to the export directory
  reset                    Clear search state and graph
  :help or ?               Show this help
  quit / exit              Leave plsh";

fn history_path() -> std::path::PathBuf {
    let mut p = AppSettings::settings_dir();
    p.push("plsh_history.txt");
    p
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let matches = Command::new("plsh")
        .about("Path-Loom Shell: search nodes, find attack paths and run Cypher against a graph API")
        .arg(Arg::new("url").long("url").value_name("URL").help("API base URL (overrides settings)"))
        .arg(Arg::new("token").long("token").value_name("TOKEN").help("Bearer token sent with every request"))
        .arg(Arg::new("eval").short('e').long("eval").value_name("CMD").help("Run a single command and exit"))
        .arg(Arg::new("quiet").short('q').long("quiet").action(ArgAction::SetTrue).help("Suppress banner/help text"))
        .get_matches();

    let settings = match AppSettings::load() {
        Ok(s) => s,
        Err(e) => {
            log::warn!("failed to load settings, using defaults: {}", e);
            AppSettings::default()
        }
    };
    let base_url = matches.get_one::<String>("url").cloned().unwrap_or_else(|| settings.api_base_url.clone());
    let token = matches.get_one::<String>("token").cloned().or_else(|| settings.api_token.clone());
    let eval = matches.get_one::<String>("eval").cloned();
    let quiet = matches.get_flag("quiet");

    let api = match HttpGraphApi::new(&base_url, token, settings.request_timeout()) {
        Ok(api) => api,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };
    let mut session = ExploreSession::with_layout(api, settings.layout.clone(), settings.link_luminance);

    // One-off eval mode
    if let Some(cmd) = eval {
        match run_command(&mut session, &settings, cmd.trim()).await {
            Ok(_) => return,
            Err(e) => {
                eprintln!("error: {:#}", e);
                std::process::exit(3);
            }
        }
    }

    let mut rl: Editor<(), DefaultHistory> = match Editor::new() {
        Ok(e) => e,
        Err(e) => {
            eprintln!("failed to initialize editor: {}", e);
            std::process::exit(1);
        }
    };
    let hist_path = history_path();
    let _ = std::fs::create_dir_all(hist_path.parent().unwrap_or_else(|| std::path::Path::new(".")));
    let _ = rl.load_history(&hist_path);

    if !quiet {
        eprintln!(
            "Using {}.\nType :help for commands, quit / exit to leave. History saved at {}.\n",
            base_url,
            hist_path.display()
        );
    }

    loop {
        match rl.readline("plsh> ") {
            Ok(line) => {
                let input = line.trim();
                if input.is_empty() { continue; }
                if input == ":quit" || input.eq_ignore_ascii_case("quit") || input.eq_ignore_ascii_case("exit") { break; }
                rl.add_history_entry(input).ok();
                if let Err(e) = run_command(&mut session, &settings, input).await {
                    eprintln!("error: {:#}", e);
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("readline error: {}", e);
                break;
            }
        }
    }

    let _ = rl.save_history(&hist_path);
}

async fn run_command(session: &mut Session, settings: &AppSettings, input: &str) -> anyhow::Result<()> {
    let (cmd, rest) = match input.split_once(char::is_whitespace) {
        Some((c, r)) => (c, r.trim()),
        None => (input, ""),
    };

    match cmd {
        ":help" | "?" => println!("{}", HELP),
        "find" => {
            if rest.is_empty() {
                anyhow::bail!("usage: find <term>");
            }
            let nodes = session.lookup(SlotId::Primary, rest).await?;
            print_options(nodes);
        }
        "from" => {
            let Some(node) = resolve_node(session, SlotId::Primary, rest).await? else {
                anyhow::bail!("no node matches '{}'", rest);
            };
            let outcome = session.dispatch(SearchAction::SourceNodeSelected { node, do_pathfinding: true }).await;
            report(session, outcome);
        }
        "to" => {
            let Some(node) = resolve_node(session, SlotId::Secondary, rest).await? else {
                anyhow::bail!("no node matches '{}'", rest);
            };
            let outcome = session.dispatch(SearchAction::DestinationNodeSelected(node)).await;
            report(session, outcome);
        }
        "swap" => {
            let outcome = session.dispatch(SearchAction::SlotsSwapped).await;
            report(session, outcome);
        }
        "search" => {
            let outcome = session.dispatch(SearchAction::PrimarySearch).await;
            report(session, outcome);
        }
        "path" => {
            let outcome = session.dispatch(SearchAction::PathfindingSearch).await;
            report(session, outcome);
        }
        "cypher" => {
            let query = if rest.is_empty() { None } else { Some(rest.to_string()) };
            let outcome = session.dispatch(SearchAction::CypherSearch(query)).await;
            report(session, outcome);
        }
        "tab" => {
            let Some(tab) = SearchTab::parse(rest) else {
                anyhow::bail!("unknown tab '{}'", rest);
            };
            let outcome = session.dispatch(SearchAction::TabChanged(tab)).await;
            report(session, outcome);
        }
        "filter" => run_filter(session, rest)?,
        "type" => {
            let Some(t) = SearchType::parse(rest) else {
                anyhow::bail!("search type must be exact or fuzzy");
            };
            session.state.apply(SearchAction::SearchTypeChanged(t));
        }
        "layout" => {
            let Some(dir) = RankDir::parse(rest) else {
                anyhow::bail!("direction must be one of TB, BT, LR, RL");
            };
            let n = session.relayout(Some(dir));
            println!("positioned {} nodes ({:?})", n, dir);
        }
        "show" => print_graph(session),
        "export" => {
            let path = session.export(&settings.export_dir())?;
            println!("exported to {}", path.display());
        }
        "reset" => session.reset(),
        other => anyhow::bail!("unknown command '{}'; try :help", other),
    }
    Ok(())
}

// A bare number picks from the slot's current options, anything else is searched
async fn resolve_node(session: &mut Session, slot: SlotId, arg: &str) -> anyhow::Result<Option<Node>> {
    if arg.is_empty() {
        anyhow::bail!("expected a match number or search term");
    }
    if let Ok(n) = arg.parse::<usize>()
        && n >= 1
        && let Some(node) = session.state.slot(slot).options.get(n - 1)
    {
        return Ok(Some(node.clone()));
    }
    let nodes = session.lookup(slot, arg).await?;
    Ok(nodes.first().cloned())
}

fn run_filter(session: &mut Session, rest: &str) -> anyhow::Result<()> {
    let mut parts = rest.splitn(2, char::is_whitespace);
    let sub = parts.next().unwrap_or("");
    let arg = parts.next().unwrap_or("").trim();
    let mut filters = session.state.path_filters.clone();
    match sub {
        "" | "list" => {
            let mut seen: Vec<&str> = Vec::new();
            for f in &filters {
                if seen.contains(&f.category.as_str()) { continue; }
                seen.push(&f.category);
                let mark = match category_state(&filters, &f.category) {
                    CheckState::Checked => "[x]",
                    CheckState::Unchecked => "[ ]",
                    CheckState::Indeterminate => "[-]",
                };
                println!("{} {}", mark, f.category);
            }
            println!("{} edge types enabled", enabled_edge_types(&filters).len());
            return Ok(());
        }
        "on" | "off" => {
            let checked = sub == "on";
            if !set_edge_type_checked(&mut filters, arg, checked) && set_category_checked(&mut filters, arg, checked) == 0 {
                anyhow::bail!("unknown edge type or category '{}'", arg);
            }
        }
        "toggle" => {
            if !toggle_edge_type(&mut filters, arg) {
                anyhow::bail!("unknown edge type '{}'", arg);
            }
        }
        other => anyhow::bail!("unknown filter command '{}'", other),
    }
    session.state.apply(SearchAction::PathFiltersSaved(filters));
    Ok(())
}

fn print_options(nodes: &[Node]) {
    if nodes.is_empty() {
        println!("no matches");
        return;
    }
    for (i, n) in nodes.iter().enumerate() {
        println!("{:>3}. {} ({}) {}", i + 1, n.display_name(), n.kind, n.object_id);
    }
}

fn report(session: &Session, outcome: Option<GraphOutcome>) {
    let Some(outcome) = outcome else {
        println!("nothing to search");
        return;
    };
    if let Some(notice) = &outcome.notice {
        println!("{}", notice.message);
    } else if let Some(err) = &outcome.error {
        println!("{}", err);
    }
    let g = session.graph();
    println!("{} nodes, {} edges", g.nodes().len(), g.edges().len());
}

fn print_graph(session: &Session) {
    let g = session.graph();
    if g.is_empty() {
        println!("graph is empty");
        return;
    }
    for n in g.nodes() {
        println!("{:<40} {:<16} ({:.0}, {:.0})", n.label, n.kind, n.x, n.y);
    }
    for e in g.edges() {
        let risk = e.impact_percent.map(|p| format!(" [{}]", percent_to_title(p * 100.0))).unwrap_or_default();
        println!("{} -[{}]-> {}{}", e.source, e.label, e.target, risk);
    }
}
