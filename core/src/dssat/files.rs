//! Engine input files: experiment (FileX), spatial batch and control file.
//!
//! Every run directory holds exactly one treatment, so every factor
//! level below is 1 (or 0 when the factor is absent).
//! Column widths are fixed by the engine's reader. Do not reflow.

use crate::{
    config::DssatConfig,
    controls::{EffectiveControls, SimOption},
    crop::Crop,
    dssat::soil::PROFILE_ID,
    treatment::Treatment,
};
use chrono::{Datelike, NaiveDate};
use std::fmt::Write;
use std::path::Path;

/// Weather series id inside the station code. One weather file per run, so always AA.
const WEATHER_SERIES: &str = "AA";

/// Two-digit year, day-of-year: the engine's date encoding.
pub fn yyddd(date: NaiveDate) -> String {
    format!("{:02}{:03}", date.year().rem_euclid(100), date.ordinal())
}

/// Station code written in the field row, e.g. `SEAA2101`.
pub fn weather_station(start: NaiveDate) -> String {
    format!("SE{WEATHER_SERIES}{:02}01", start.year().rem_euclid(100))
}

/// Weather file name the engine looks for in a given year, e.g. `SEAA2101.WTH`.
pub fn weather_file_name(year: i32) -> String {
    format!("SE{WEATHER_SERIES}{:02}01.WTH", year.rem_euclid(100))
}

pub fn experiment_file_name(crop: &Crop) -> String {
    format!("EXPEFILE.{}X", crop.code)
}

/// Render the experiment file for one treatment.
pub fn render_experiment(
    crop: &Crop,
    treatment: &Treatment,
    controls: &EffectiveControls,
) -> String {
    let planting = yyddd(treatment.planting_date);
    let fertilizer_level = if treatment.nitrogen.is_empty() { 0 } else { 1 };
    let mut s = String::new();

    s.push_str("*EXP.DETAILS: SPATIAL RUN, ONE LOCATION PER DIRECTORY\n\n");
    s.push_str(
        "*GENERAL\n\
         @PEOPLE\n\
         -99\n\
         @ADDRESS\n\
         -99\n\
         @SITE\n\
         -99\n\
         @ PAREA  PRNO  PLEN  PLDR  PLSP  PLAY HAREA  HRNO  HLEN  HARM.........\n    \
         -99   -99   -99   -99   -99   -99   -99   -99   -99   -99\n\n",
    );

    // ── Treatments ─────────────────────────────────────────────
    s.push_str("*TREATMENTS                        -------------FACTOR LEVELS------------\n");
    s.push_str("@N R O C TNAME.................... CU FL SA IC MP MI MF MR MC MT ME MH SM\n");
    // IC 0: engine defaults, soil at field capacity with no initial nitrogen.
    let _ = writeln!(
        s,
        "{:>2} 1 0 0 SAMPLE {:<18} {:>2} {:>2}  0 {:>2} {:>2}  0 {:>2}  0  0  0  0  0  1\n",
        1, treatment.location_id, 1, 1, 0, 1, fertilizer_level
    );

    // ── Cultivars ──────────────────────────────────────────────
    s.push_str("*CULTIVARS\n@C CR INGENO CNAME\n");
    let _ = writeln!(
        s,
        "{:>2} {} {:>6} {:<8}\n",
        1, crop.code, treatment.cultivar, treatment.cultivar
    );

    // ── Fields ─────────────────────────────────────────────────
    s.push_str("*FIELDS\n");
    s.push_str("@L ID_FIELD WSTA....  FLSA  FLOB  FLDT  FLDD  FLDS  FLST SLTX  SLDP  ID_SOIL    FLNAME\n");
    let _ = writeln!(
        s,
        "{0:>2} SEFL00{0:02} {1}   -99     0 DR000     0     0 00000 -99    200  {2} -99\n",
        1,
        weather_station(treatment.planting_date),
        PROFILE_ID
    );

    // ── Planting ───────────────────────────────────────────────
    s.push_str("*PLANTING DETAILS\n");
    s.push_str("@P PDATE EDATE  PPOP  PPOE  PLME  PLDS  PLRS  PLRD  PLDP  PLWT  PAGE  PENV  PLPH  SPRL                        PLNAME\n");
    let _ = writeln!(
        s,
        "{:>2} {:<5}   -99   4.0   4.0     S     R    90     0     4   -99   -99   -99   -99   -99                        -99\n",
        1, planting
    );

    // ── Fertilizers (urea, 5 cm, days after planting) ──────────
    s.push_str("*FERTILIZERS (INORGANIC)\n");
    s.push_str("@F FDATE  FMCD  FACD  FDEP  FAMN  FAMP  FAMK  FAMC  FAMO  FOCD FERNAME\n");
    for application in &treatment.nitrogen {
        let _ = writeln!(
            s,
            "{:>2} {:<5} FE005   -99     5 {:5.1}   -99   -99   -99   -99   -99 -99",
            1, application.days_after_planting, application.rate_kg_ha
        );
    }
    s.push('\n');

    render_controls(&mut s, &planting, controls);
    s
}

fn render_controls(s: &mut String, start: &str, controls: &EffectiveControls) {
    let v = |o: SimOption| controls.get(o);
    s.push_str("*SIMULATION CONTROLS\n");
    s.push_str("@N GENERAL     NYERS NREPS START SDATE RSEED SNAME.................... SMODEL\n");
    let _ = writeln!(s, " 1 GE              1     1     P {start:<5}  2150 N SPATIAL ANALYSES");
    s.push_str("@N OPTIONS     WATER NITRO SYMBI PHOSP POTAS DISES  CHEM  TILL   CO2\n");
    let _ = writeln!(
        s,
        " 1 OP              {}     {}     {}     {}     {}     N     N     N     {}",
        v(SimOption::Water),
        v(SimOption::Nitro),
        v(SimOption::Symbi),
        v(SimOption::Phosp),
        v(SimOption::Potas),
        v(SimOption::Co2),
    );
    s.push_str("@N METHODS     WTHER INCON LIGHT EVAPO INFIL PHOTO HYDRO MESOM MESEV MESOL\n");
    let _ = writeln!(
        s,
        " 1 ME              M     M     {}     {}     {}     {}     R     {}     {}     {}",
        v(SimOption::Light),
        v(SimOption::Evapo),
        v(SimOption::Infil),
        v(SimOption::Photo),
        v(SimOption::Mesom),
        v(SimOption::Mesev),
        v(SimOption::Mesol),
    );
    s.push_str(
        "@N MANAGEMENT  PLANT IRRIG FERTI RESID HARVS\n \
         1 MA              R     N     D     N     M\n\
         @N OUTPUTS     FNAME OVVEW SUMRY FROPT GROUT CAOUT WAOUT NIOUT MIOUT DIOUT VBOSE CHOUT OPOUT FMOPT\n \
         1 OU              N     N     N     1     N     N     N     N     N     N     Y     N     N     A\n\n\
         @  AUTOMATIC MANAGEMENT\n\
         @N PLANTING    PFRST PLAST PH2OL PH2OU PH2OD PSTMX PSTMN\n \
         1 PL          98155 98200    40   100    30    40    10\n\
         @N IRRIGATION  IMDEP ITHRL ITHRU IROFF IMETH IRAMT IREFF\n \
         1 IR             30    50   100 GS000 IR001    10     1\n\
         @N NITROGEN    NMDEP NMTHR NAMNT NCODE NAOFF\n \
         1 NI             30    50    25 FE001 GS000\n\
         @N RESIDUES    RIPCN RTIME RIDEP\n \
         1 RE            100     1    20\n\
         @N HARVEST     HFRST HLAST HPCNP HPCNR\n \
         1 HA              0 81365   100     0\n",
    );
}

/// Render the spatial-mode batch file pointing at `experiment`.
pub fn render_batch(config: &DssatConfig, work_dir: &Path, crop: &Crop, experiment: &Path) -> String {
    let bin = config.binary_name();
    let batch = config.batch_file_name();
    let mut s = String::new();
    s.push_str("$BATCH(SPATIAL)\n!\n");
    let _ = writeln!(s, "! Directory    : {}", work_dir.display());
    let _ = writeln!(s, "! Command Line : {bin} S {batch}");
    s.push_str("! Crop         : Spatial\n");
    let _ = writeln!(s, "! Experiment   : {}", experiment_file_name(crop));
    s.push_str("! ExpNo        : 1\n");
    let _ = writeln!(s, "! Debug        : {bin} \" S {batch}\"");
    s.push_str("!\n");
    s.push_str("@FILEX                                                                                        TRTNO     RP     SQ     OP     CO\n");
    let _ = writeln!(
        s,
        "{:<96} {:>2}      1      0      0      0",
        experiment.display().to_string(),
        1
    );
    s
}

/// Render the control file telling the engine where its data directories live.
pub fn render_control(config: &DssatConfig, home: &Path, work_dir: &Path, crop: &Crop) -> String {
    let module_dir = if crop.uses_shared_cereal_module() { work_dir } else { home };
    let mut s = String::new();
    s.push_str("WED    Weather\n");
    let _ = writeln!(
        s,
        "M{}    {} {} {}{}",
        crop.code,
        module_dir.display(),
        config.binary_name(),
        crop.module,
        config.version
    );
    let _ = writeln!(s, "CRD    {}", home.join("Genotype").display());
    let _ = writeln!(s, "PSD    {}", home.join("Pest").display());
    let _ = writeln!(s, "SLD    {}", home.join("Soil").display());
    let _ = writeln!(s, "STD    {}", home.join("StandardData").display());
    s
}
