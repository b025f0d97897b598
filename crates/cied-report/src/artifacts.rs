//! Tabular renderings of fitted-model results.

use cied_stats::{Coefficient, FittedModel, MarginalEffect};

use crate::table::{CsvTable, number};

const STAT_COLUMNS: [&str; 6] = ["std_err", "z", "p", "ci_low", "ci_high", "n_obs"];

pub fn coefficient_table(model: &FittedModel) -> CsvTable {
    let mut headers = vec!["term", "coef"];
    headers.extend(STAT_COLUMNS);
    let mut table = CsvTable::new(&headers);
    let n_obs = model.n_obs().to_string();
    for Coefficient {
        term,
        coef,
        std_err,
        z,
        p,
        ci_low,
        ci_high,
    } in model.coefficients()
    {
        table.push(vec![
            term,
            number(coef),
            number(std_err),
            number(z),
            number(p),
            number(ci_low),
            number(ci_high),
            n_obs.clone(),
        ]);
    }
    table
}

pub fn margins_table(effects: &[MarginalEffect]) -> CsvTable {
    let mut table = CsvTable::new(&["term", "dydx", "std_err", "z", "p", "ci_low", "ci_high"]);
    for effect in effects {
        table.push(vec![
            effect.term.clone(),
            number(effect.dydx),
            number(effect.std_err),
            number(effect.z),
            number(effect.p),
            number(effect.ci_low),
            number(effect.ci_high),
        ]);
    }
    table
}
