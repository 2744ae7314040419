use helpers::general::format_laptime;
use racesim::core::car::{CarPars, Pace, TireType};
use racesim::core::lap::LapOutcome;
use racesim::core::race::{LapReport, RaceSession, SimConstants};
use racesim::pre::sim_opts::SimOpts;
use std::io::{self, Write};

const PLAYER_COLOR: &str = "#1e90ff";

/// The function runs the interactive console race: per lap it shows the
/// weather and the player's car, collects the pace and pit decisions,
/// advances the simulation and prints the standings. All input is validated
/// here and re-prompted on error; the engine only ever receives valid
/// values.
pub fn run_interactive(consts: &SimConstants, sim_opts: &SimOpts) -> anyhow::Result<()> {
    println!("Welcome to the race weekend!");

    let tot_no_laps = match sim_opts.tot_no_laps {
        Some(laps) if laps > 0 => laps,
        _ => ask_laps()?,
    };
    let team = ask_team_name()?;
    let tire = ask_tire_choice("Choose your starting tires:")?;

    let mut session = RaceSession::new(consts.clone(), tot_no_laps, sim_opts.seed);
    let player_pars = CarPars::player(team, PLAYER_COLOR.to_owned(), &consts.car_pars, tire);
    session.register_player(&player_pars);
    session.add_randomized_grid(consts.no_ai_cars);

    while !session.finished() && !session.player_retired() {
        println!();
        println!("Lap {}/{}", session.cur_lap() + 1, tot_no_laps);
        println!("{}", "-".repeat(50));
        show_status(&session);

        ask_player_pace(&mut session)?;
        offer_pit_stop(&mut session)?;

        let report = session.simulate_lap();
        show_lap_results(&session, &report);

        if !session.finished() && !session.player_retired() {
            wait_for_enter()?;
        }
    }

    if session.player_retired() {
        println!();
        println!("You did not finish!");
        println!("Race is over!");

        // the rest of the field races on without further input
        if !session.finished() {
            println!("The remaining cars complete the distance...");
            while !session.finished() {
                session.simulate_lap();
            }
        }
    }

    show_final_results(&session);

    let race_result = session.race_result();
    if sim_opts.debug {
        race_result.print_lap_and_race_times();
    }

    let txt_path = race_result.write_lap_and_race_times_to_file(None)?;
    println!("INFO: Lap and race times written to {}", txt_path);
    let csv_path = race_result.write_csv(None)?;
    println!("INFO: Lap times CSV written to {}", csv_path);

    if sim_opts.plot {
        let plot_path = crate::export_results_plot(&race_result)?;
        println!("INFO: Lap time chart written to {}", plot_path);
    }

    Ok(())
}

// -------------------------------------------------------------------------------------------------
// OUTPUT ------------------------------------------------------------------------------------------
// -------------------------------------------------------------------------------------------------

fn show_status(session: &RaceSession) {
    let weather = session.weather_status();
    println!(
        "Weather: {} at {}°C",
        weather.condition.name(),
        weather.temperature_c
    );

    if let Some(status) = session.player_status() {
        println!("Your car:");
        println!(
            "  Fuel: {:.1} / {:.0} L",
            status.fuel_l, status.tank_capacity_l
        );
        println!(
            "  Tires: {} at {:.0}%",
            status.tire.name(),
            status.tire_condition
        );
        println!(
            "  Pace: {} | Top speed: {:.0} km/h | Mileage: {:.1} km",
            status.pace.name(),
            status.effective_top_speed_kmh,
            status.mileage_km
        );
    }
}

fn show_lap_results(session: &RaceSession, report: &LapReport) {
    if report.weather_changed {
        let weather = session.weather_status();
        println!(
            "Weather update: {} at {}°C",
            weather.condition.name(),
            weather.temperature_c
        );
    }

    for (team, outcome) in &report.outcomes {
        if let LapOutcome::Retired(cause) = outcome {
            println!("{} is out of the race ({}).", team, cause.name());
        }
    }

    println!();
    println!("Standings after lap {}:", report.lap);
    for row in session.standings_rows() {
        if row.retired {
            println!(
                "{:2}. {:<12} | {:<6} | DNF",
                row.position,
                row.team,
                row.tire.name()
            );
        } else {
            let gap = if row.position == 1 {
                String::from("leader")
            } else {
                format!("+{:.2}s", row.gap_to_leader_s)
            };
            println!(
                "{:2}. {:<12} | {:<6} {:>3.0}% | Last: {} | Gap: {}",
                row.position,
                row.team,
                row.tire.name(),
                row.tire_condition,
                format_laptime(row.last_lap_s),
                gap
            );
        }
    }
}

fn show_final_results(session: &RaceSession) {
    println!();
    println!("Race finished!");
    println!("{}", "-".repeat(40));

    for row in session.standings_rows() {
        let result = if row.retired {
            String::from("DNF")
        } else {
            format_laptime(row.total_time_s)
        };
        println!("{:2}. {:<12} | Result: {}", row.position, row.team, result);
    }
}

// -------------------------------------------------------------------------------------------------
// INPUT -------------------------------------------------------------------------------------------
// -------------------------------------------------------------------------------------------------

fn read_trimmed_line() -> anyhow::Result<String> {
    io::stdout().flush()?;
    let mut buf = String::new();
    io::stdin().read_line(&mut buf)?;
    Ok(buf.trim().to_owned())
}

fn ask_laps() -> anyhow::Result<u32> {
    loop {
        print!("Enter the race distance in laps: ");
        match read_trimmed_line()?.parse::<u32>() {
            Ok(laps) if laps > 0 => return Ok(laps),
            _ => println!("Invalid value. Please enter a positive number."),
        }
    }
}

fn ask_team_name() -> anyhow::Result<String> {
    loop {
        print!("Enter the name of your team: ");
        let name = read_trimmed_line()?;
        if !name.is_empty() {
            return Ok(name);
        }
        println!("The team name must not be empty.");
    }
}

fn ask_tire_choice(prompt: &str) -> anyhow::Result<TireType> {
    loop {
        println!("{}", prompt);
        println!("1. Soft");
        println!("2. Medium");
        println!("3. Hard");
        println!("4. Wet");

        if let Ok(code) = read_trimmed_line()?.parse::<u8>() {
            if let Some(tire) = TireType::from_code(code) {
                return Ok(tire);
            }
        }
        println!("Invalid tire selection. Please try again.");
    }
}

fn ask_player_pace(session: &mut RaceSession) -> anyhow::Result<()> {
    loop {
        println!("Choose your race pace:");
        println!("1. Economic");
        println!("2. Normal");
        println!("3. Aggressive");

        if let Ok(code) = read_trimmed_line()?.parse::<u8>() {
            if let Some(pace) = Pace::from_code(code) {
                session.set_player_pace(pace);
                return Ok(());
            }
        }
        println!("Invalid value. Please try again.");
    }
}

fn ask_refuel_amount(max_l: f64) -> anyhow::Result<f64> {
    loop {
        print!("How many liters of fuel to add? (0-{:.1} L): ", max_l);
        match read_trimmed_line()?.parse::<f64>() {
            Ok(amount) if !amount.is_finite() || amount < 0.0 => {
                println!("Please enter a non-negative number.")
            }
            Ok(amount) if amount > max_l => println!("Too much! Not enough space in the tank."),
            Ok(amount) => return Ok(amount),
            Err(_) => println!("Invalid number. Please try again."),
        }
    }
}

fn offer_pit_stop(session: &mut RaceSession) -> anyhow::Result<()> {
    println!("Do you want to make a pit stop? (y/n)");
    if read_trimmed_line()?.to_lowercase() != "y" {
        return Ok(());
    }

    let status = match session.player_status() {
        Some(status) => status,
        None => return Ok(()),
    };

    println!("Keep the current tires? (y/n)");
    let new_tire = if read_trimmed_line()?.to_lowercase() == "y" {
        None
    } else {
        Some(ask_tire_choice("Choose the new tires:")?)
    };

    let refuel_l = ask_refuel_amount(status.tank_capacity_l - status.fuel_l)?;

    if new_tire.is_none() && refuel_l <= 0.0 {
        println!("Nothing to do - you pass the pit lane.");
        return Ok(());
    }

    if session.player_pit_stop(refuel_l, new_tire) {
        println!("Pit stop scheduled: the penalties land on this lap's time.");
    }
    Ok(())
}

fn wait_for_enter() -> anyhow::Result<()> {
    println!("Press Enter to continue...");
    read_trimmed_line()?;
    Ok(())
}
