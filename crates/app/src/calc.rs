//! `calc` subcommand: the lesson calculators on the command line.

use std::error::Error;

use study_core::finance::{
    RoeBreakdown, Tranche, nominal_rate, pool_collections, real_rate, real_rate_approx,
    run_waterfall,
};

use crate::{ArgsError, parse_value, require_value};

pub(crate) fn run(args: &mut impl Iterator<Item = String>) -> Result<(), Box<dyn Error>> {
    let kind = require_value(args, "calc")?;
    match kind.as_str() {
        "fisher" => fisher(args),
        "roe" => roe(args),
        "waterfall" => waterfall(args),
        _ => Err(ArgsError::UnknownCalculator(kind).into()),
    }
}

fn fisher(args: &mut impl Iterator<Item = String>) -> Result<(), Box<dyn Error>> {
    let mut nominal = None;
    let mut inflation = None;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--nominal" => nominal = Some(parse_value::<f64>(args, "--nominal")?),
            "--inflation" => inflation = Some(parse_value::<f64>(args, "--inflation")?),
            _ => return Err(ArgsError::UnknownArg(arg).into()),
        }
    }
    let nominal = nominal.ok_or(ArgsError::MissingValue { flag: "--nominal" })?;
    let inflation = inflation.ok_or(ArgsError::MissingValue { flag: "--inflation" })?;

    let exact = real_rate(nominal, inflation)?;
    println!("Nominal rate:        {}", percent(nominal));
    println!("Inflation:           {}", percent(inflation));
    println!("Real rate (exact):   {}", percent(exact));
    println!(
        "Real rate (i - pi):  {}",
        percent(real_rate_approx(nominal, inflation))
    );
    println!(
        "Check (1+r)(1+pi)-1: {}",
        percent(nominal_rate(exact, inflation)?)
    );
    Ok(())
}

fn roe(args: &mut impl Iterator<Item = String>) -> Result<(), Box<dyn Error>> {
    let mut income = None;
    let mut assets = None;
    let mut equity = None;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--income" => income = Some(parse_value::<f64>(args, "--income")?),
            "--assets" => assets = Some(parse_value::<f64>(args, "--assets")?),
            "--equity" => equity = Some(parse_value::<f64>(args, "--equity")?),
            _ => return Err(ArgsError::UnknownArg(arg).into()),
        }
    }
    let breakdown = RoeBreakdown::from_balance_sheet(
        income.ok_or(ArgsError::MissingValue { flag: "--income" })?,
        assets.ok_or(ArgsError::MissingValue { flag: "--assets" })?,
        equity.ok_or(ArgsError::MissingValue { flag: "--equity" })?,
    )?;

    println!("ROA:            {}", percent(breakdown.roa));
    println!("Leverage (EM):  {:.2}x", breakdown.leverage);
    println!("ROE = ROA x EM: {}", percent(breakdown.roe));
    println!("Capital ratio:  {}", percent(breakdown.capital_ratio()));
    Ok(())
}

fn waterfall(args: &mut impl Iterator<Item = String>) -> Result<(), Box<dyn Error>> {
    let mut pool = None;
    let mut default_rate = 0.0_f64;
    let mut recovery = 0.0_f64;
    let mut tranches = Vec::new();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--pool" => pool = Some(parse_value::<f64>(args, "--pool")?),
            "--default-rate" => default_rate = parse_value(args, "--default-rate")?,
            "--recovery" => recovery = parse_value(args, "--recovery")?,
            "--tranche" => tranches.push(parse_tranche(&require_value(args, "--tranche")?)?),
            _ => return Err(ArgsError::UnknownArg(arg).into()),
        }
    }
    if tranches.is_empty() {
        return Err(ArgsError::MissingValue { flag: "--tranche" }.into());
    }
    let pool = match pool {
        Some(pool) => pool,
        None => tranches.iter().map(|t| t.principal).sum(),
    };

    let collections = pool_collections(pool, default_rate, recovery)?;
    let payouts = run_waterfall(&tranches, collections)?;

    println!("Pool {pool:.2}, collections {collections:.2}");
    println!(
        "{:<12} {:>12} {:>12} {:>12} {:>9}",
        "tranche", "principal", "paid", "loss", "recovery"
    );
    for payout in &payouts {
        println!(
            "{:<12} {:>12.2} {:>12.2} {:>12.2} {:>9}",
            payout.name,
            payout.principal,
            payout.paid,
            payout.loss,
            percent(payout.recovery())
        );
    }
    Ok(())
}

fn parse_tranche(raw: &str) -> Result<Tranche, ArgsError> {
    let invalid = || ArgsError::InvalidTranche {
        raw: raw.to_string(),
    };
    let (name, amount) = raw.split_once('=').ok_or_else(invalid)?;
    let name = name.trim();
    if name.is_empty() {
        return Err(invalid());
    }
    let amount = amount.trim().parse::<f64>().map_err(|_| invalid())?;
    Ok(Tranche::new(name, amount))
}

fn percent(rate: f64) -> String {
    format!("{:.2}%", rate * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tranche_is_name_equals_amount() {
        let tranche = parse_tranche("senior = 80").unwrap();
        assert_eq!(tranche, Tranche::new("senior", 80.0));
    }

    #[test]
    fn malformed_tranche_is_rejected() {
        for raw in ["senior", "=80", "senior=lots"] {
            assert!(matches!(
                parse_tranche(raw),
                Err(ArgsError::InvalidTranche { .. })
            ));
        }
    }

    #[test]
    fn percent_formats_fraction() {
        assert_eq!(percent(0.0525), "5.25%");
    }

    #[test]
    fn unknown_calculator_is_an_error() {
        let mut args = ["npv"].into_iter().map(String::from);
        assert!(run(&mut args).is_err());
    }
}
