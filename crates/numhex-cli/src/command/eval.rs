use std::{collections::BTreeMap, path::PathBuf};

use anyhow::Context as _;
use numhex_engine::{
    CellId, Evaluation, Grid, GridSeed, Level, LevelTargets, MIN_PATH_LEN, SelectedPath, Topology,
    evaluate, judge,
};

use super::generate::LevelPack;
use crate::{config::CliConfig, util};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct EvalArg {
    /// Cells of the path, as `row-col`
    cells: Vec<CellId>,
    /// Seed the level is generated from
    #[clap(long, conflicts_with = "pack", required_unless_present = "pack")]
    seed: Option<GridSeed>,
    /// Level pack written by `generate`
    #[clap(long)]
    pack: Option<PathBuf>,
    /// Index of the level within the seed or pack
    #[clap(long, default_value_t = 0)]
    index: usize,
    /// List a path for every target
    #[clap(long, default_value_t = false)]
    solve: bool,
    /// Longest path considered by `--solve`
    #[clap(long, default_value_t = 7)]
    max_len: usize,
}

pub(crate) fn run(config: &CliConfig, arg: &EvalArg) -> anyhow::Result<()> {
    let EvalArg {
        cells,
        seed,
        pack,
        index,
        solve,
        max_len,
    } = arg;

    let (level, topology) = match (seed, pack) {
        (_, Some(path)) => {
            let mut pack: LevelPack = util::read_json_file("level pack", path)?;
            let count = pack.levels.len();
            anyhow::ensure!(*index < count, "level pack has only {count} levels");
            (pack.levels.swap_remove(*index), pack.config.grid.topology)
        }
        (Some(seed), None) => {
            let pack = LevelPack::generate(&config.game, *seed, index + 1);
            let level = pack
                .levels
                .into_iter()
                .next_back()
                .context("no level generated")?;
            (level, config.game.grid.topology)
        }
        (None, None) => anyhow::bail!("either --seed or --pack is required"),
    };

    print_level(&level);
    if !cells.is_empty() {
        println!();
        eval_path(level.grid(), topology, level.targets(), cells)?;
    }
    if *solve {
        println!();
        print_solutions(&level, topology, *max_len);
    }
    Ok(())
}

fn print_level(level: &Level) {
    for (row, cells) in level.grid().row_slices().enumerate() {
        let indent = if row % 2 == 1 { "  " } else { "" };
        let line = cells
            .iter()
            .map(|cell| format!("{:^4}", cell.value().to_string()))
            .collect::<String>();
        println!("{row:>2} | {indent}{line}");
    }
    let targets = level
        .targets()
        .values()
        .map(|value| value.to_string())
        .collect::<Vec<_>>();
    println!("targets: {}", targets.join(", "));
}

fn expression(grid: &Grid, ids: &[CellId]) -> String {
    ids.iter()
        .filter_map(|&id| grid.get(id))
        .map(|cell| cell.value().to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

fn eval_path(
    grid: &Grid,
    topology: Topology,
    targets: &LevelTargets,
    cells: &[CellId],
) -> anyhow::Result<()> {
    let mut path = SelectedPath::new();
    for (step, &id) in cells.iter().enumerate() {
        let result = if step == 0 {
            path.try_start(grid, id)
        } else {
            path.try_extend(grid, topology, id)
        };
        result.with_context(|| format!("cell {id} (step {}) rejected", step + 1))?;
    }

    let ids = path.ids();
    if ids.len() < MIN_PATH_LEN {
        println!(
            "path of {} cells is discarded: at least {MIN_PATH_LEN} are needed",
            ids.len()
        );
        return Ok(());
    }

    let value = evaluate(grid, ids);
    let shown = value.map_or_else(|| "?".to_owned(), |v| v.to_string());
    println!("{} = {shown}", expression(grid, ids));
    match judge(value, targets) {
        Evaluation::Matched { target_index, .. } => {
            println!("matches target #{} ({shown})", target_index + 1);
        }
        Evaluation::Missed { .. } => println!("no target has this value"),
        Evaluation::Invalid => println!("path has no value"),
    }
    Ok(())
}

fn print_solutions(level: &Level, topology: Topology, max_len: usize) {
    let found = find_paths(level.grid(), topology, level.targets(), max_len);
    for value in level.targets().values() {
        match found.get(&value) {
            Some(ids) => {
                let cells = ids.iter().map(ToString::to_string).collect::<Vec<_>>();
                println!(
                    "{value:>4}: {} = {value}  [{}]",
                    expression(level.grid(), ids),
                    cells.join(" ")
                );
            }
            None => println!("{value:>4}: no path within {max_len} cells"),
        }
    }
}

/// Finds one path for each target value reachable within `max_len` cells.
///
/// The search is depth-first and keeps the first path found for a value,
/// which is not necessarily the shortest.
fn find_paths(
    grid: &Grid,
    topology: Topology,
    targets: &LevelTargets,
    max_len: usize,
) -> BTreeMap<u32, Vec<CellId>> {
    let wanted = targets.values().collect::<Vec<_>>();
    let mut found = BTreeMap::new();
    let mut path = SelectedPath::new();
    for cell in grid.cells() {
        if path.try_start(grid, cell.id()).is_ok() {
            search(grid, topology, &wanted, max_len, &mut path, &mut found);
        }
        if found.len() == wanted.len() {
            break;
        }
    }
    found
}

fn search(
    grid: &Grid,
    topology: Topology,
    wanted: &[u32],
    max_len: usize,
    path: &mut SelectedPath,
    found: &mut BTreeMap<u32, Vec<CellId>>,
) {
    if let Some(value) = evaluate(grid, path.ids())
        && let Ok(value) = u32::try_from(value)
        && wanted.contains(&value)
    {
        found.entry(value).or_insert_with(|| path.ids().to_vec());
    }
    if path.len() >= max_len || found.len() == wanted.len() {
        return;
    }

    let Some(last) = path.last() else {
        return;
    };
    let candidates: Vec<CellId> = match topology {
        Topology::Unrestricted => grid.cells().iter().map(|cell| cell.id()).collect(),
        _ => grid.neighbors(last, topology).into_iter().collect(),
    };
    for next in candidates {
        let mut branch = path.clone();
        if branch.try_extend(grid, topology, next).is_ok() {
            search(grid, topology, wanted, max_len, &mut branch, found);
        }
    }
}
