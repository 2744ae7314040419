use anyhow::Context;
use clap::Parser;
use plotters::prelude::*;
use racesim::core::race::{RaceSession, SimConstants};
use racesim::core::weather::WeatherCondition;
use racesim::post::race_result::{EventKind, RaceResult};
use racesim::pre::read_sim_pars::load_sim_constants;
use racesim::pre::sim_opts::SimOpts;
use rayon::prelude::*;
use std::collections::HashMap;
use std::time::Instant;

mod menu;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    // PRE-PROCESSING ------------------------------------------------------------------------------
    // get simulation options from the command line arguments
    let sim_opts: SimOpts = SimOpts::parse();

    // get simulation constants (built-in defaults unless a file is given)
    if let Some(parfile_path) = &sim_opts.parfile_path {
        println!("INFO: Reading simulation constants from {:?}", parfile_path);
    }
    let mut consts = load_sim_constants(sim_opts.parfile_path.as_deref())?;

    if let Some(no_ai_cars) = sim_opts.no_ai_cars {
        consts.no_ai_cars = no_ai_cars;
    }
    log::debug!("simulation constants: {:?}", consts);

    // EXECUTION -----------------------------------------------------------------------------------
    if sim_opts.auto {
        run_auto(&consts, &sim_opts)
    } else {
        menu::run_interactive(&consts, &sim_opts)
    }
}

/// The function runs one race with every car under AI control.
fn simulate_auto_race(consts: &SimConstants, tot_no_laps: u32, seed: Option<u64>) -> RaceResult {
    let mut session = RaceSession::new(consts.clone(), tot_no_laps, seed);
    session.add_randomized_grid(consts.no_ai_cars.max(2));

    while !session.finished() {
        session.simulate_lap();
    }

    session.race_result()
}

fn run_auto(consts: &SimConstants, sim_opts: &SimOpts) -> anyhow::Result<()> {
    let tot_no_laps = sim_opts.tot_no_laps.unwrap_or(10);

    if sim_opts.no_sim_runs <= 1 {
        println!("INFO: Running the simulation without the menu...");
        let t_start = Instant::now();
        let race_result = simulate_auto_race(consts, tot_no_laps, sim_opts.seed);
        println!("INFO: Execution time: {}ms", t_start.elapsed().as_millis());

        if sim_opts.debug {
            race_result.print_lap_and_race_times();
        }
        race_result.print_final_classification();

        let txt_path = race_result.write_lap_and_race_times_to_file(None)?;
        println!("INFO: Lap and race times written to {}", txt_path);
        let csv_path = race_result.write_csv(None)?;
        println!("INFO: Lap times CSV written to {}", csv_path);

        if sim_opts.plot {
            let plot_path = export_results_plot(&race_result)?;
            println!("INFO: Lap time chart written to {}", plot_path);
        }

        return Ok(());
    }

    // batch mode: independent seeded runs in parallel
    println!("INFO: Running {} simulations...", sim_opts.no_sim_runs);
    let t_start = Instant::now();

    let results: Vec<RaceResult> = (0..sim_opts.no_sim_runs)
        .into_par_iter()
        .map(|run| {
            let seed = sim_opts.seed.map(|seed| seed + run as u64);
            simulate_auto_race(consts, tot_no_laps, seed)
        })
        .collect();

    println!("INFO: Execution time: {}ms", t_start.elapsed().as_millis());

    let mut wins: HashMap<String, u32> = HashMap::new();
    let mut no_dnfs = 0usize;
    let mut no_starters = 0usize;

    for race_result in &results {
        no_starters += race_result.teams.len();
        no_dnfs += race_result.dnf.iter().filter(|&&dnf| dnf).count();

        if let Some(&winner_idx) = race_result.classification().first() {
            if !race_result.dnf[winner_idx] {
                *wins
                    .entry(race_result.teams[winner_idx].clone())
                    .or_insert(0) += 1;
            }
        }
    }

    println!("RESULT: Wins over {} runs", results.len());
    let mut wins_sorted: Vec<(String, u32)> = wins.into_iter().collect();
    wins_sorted.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    for (team, no_wins) in wins_sorted {
        println!("{:<12} | {}", team, no_wins);
    }
    println!(
        "RESULT: DNF rate {:.1}% ({} of {} starters)",
        no_dnfs as f64 / no_starters as f64 * 100.0,
        no_dnfs,
        no_starters
    );

    Ok(())
}

/// The function renders the lap times of all cars over the race distance as
/// a PNG chart: one line per car in its team color, grey background bands
/// for rainy laps and vertical markers for pit stops and retirements.
pub(crate) fn export_results_plot(result: &RaceResult) -> anyhow::Result<String> {
    let out_dir = std::path::Path::new("output");
    std::fs::create_dir_all(out_dir)?;
    let ts = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)?
        .as_secs();
    let out_path = out_dir.join(format!("race_plot_{}.png", ts));

    let tot_laps = result.tot_no_laps as usize;

    // y range over all finite lap times
    let mut y_min = f64::INFINITY;
    let mut y_max = f64::NEG_INFINITY;
    for i in 0..result.teams.len() {
        for lap in 1..=tot_laps {
            let t_lap = result.laptimes[i][lap];
            if t_lap.is_finite() && t_lap > 0.0 {
                y_min = y_min.min(t_lap);
                y_max = y_max.max(t_lap);
            }
        }
    }
    if !y_min.is_finite() || !y_max.is_finite() {
        y_min = 0.0;
        y_max = 1.0;
    }
    let margin = (y_max - y_min).max(1.0) * 0.05;
    y_min -= margin;
    y_max += margin;

    let out_path_string = out_path.to_string_lossy().into_owned();
    let root = BitMapBackend::new(&out_path_string, (1280, 720)).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption("Lap times", ("sans-serif", 24).into_font())
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(1u32..result.tot_no_laps + 1, y_min..y_max)?;

    // light-grey background bands for rainy laps
    for lap in 1..=tot_laps {
        let is_rain = matches!(
            result.weather_history.get(lap - 1),
            Some(WeatherCondition::Rain)
        );
        if is_rain {
            let x0 = lap as u32;
            let x1 = (lap as u32).saturating_add(1);
            chart.draw_series(std::iter::once(Rectangle::new(
                [(x0, y_min), (x1, y_max)],
                RGBAColor(200, 200, 200, 0.20).filled(),
            )))?;
        }
    }

    chart
        .configure_mesh()
        .x_desc("Lap")
        .y_desc("s")
        .label_style(("sans-serif", 16))
        .axis_desc_style(("sans-serif", 16))
        .draw()?;

    for (i, team) in result.teams.iter().enumerate() {
        let tmp_color = result.colors[i]
            .parse::<css_color_parser::Color>()
            .context("Could not parse hex color!")?;
        let rgb = RGBColor(tmp_color.r, tmp_color.g, tmp_color.b);

        let mut series: Vec<(u32, f64)> = Vec::new();
        for lap in 1..=tot_laps {
            let t_lap = result.laptimes[i][lap];
            if t_lap.is_finite() && t_lap > 0.0 {
                series.push((lap as u32, t_lap));
            }
        }

        chart
            .draw_series(LineSeries::new(series.into_iter(), rgb))?
            .label(team.to_owned())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], rgb));
    }

    for event in &result.events {
        let x = event.lap;
        let (color, width) = match event.kind {
            EventKind::WeatherChange => (RGBColor(150, 150, 150), 1),
            EventKind::PitStop => (RGBColor(255, 165, 0), 1),
            EventKind::FuelExhausted | EventKind::Incident => (RED, 2),
        };
        chart.draw_series(std::iter::once(PathElement::new(
            vec![(x, y_min), (x, y_max)],
            color.stroke_width(width),
        )))?;
    }

    chart
        .configure_series_labels()
        .border_style(&BLACK)
        .background_style(&WHITE.mix(0.8))
        .label_font(("sans-serif", 16))
        .position(plotters::chart::SeriesLabelPosition::UpperRight)
        .draw()?;

    root.present()?;
    Ok(out_path_string.clone())
}
