use std::{
    fs::File,
    io::Write,
    path::{Path, PathBuf},
    str::FromStr,
};

use crate::prelude::{Duration, Epoch, TimeScale, SV};
use rand::{distributions::Alphanumeric, Rng};

/*
 * Tool to generate random names when we need to produce a file
 */
pub fn random_name(size: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(size)
        .map(char::from)
        .collect()
}

/*
 * Creates a unique scratch directory
 */
pub fn scratch_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("sp3-clock-{}", random_name(8)));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

pub fn sv(descriptor: &str) -> SV {
    SV::from_str(descriptor).unwrap()
}

pub fn midnight(y: i32, m: u8, d: u8) -> Epoch {
    Epoch::from_gregorian_at_midnight(y, m, d, TimeScale::GPST)
}

/*
 * Evenly spaced epochs, end included
 */
pub fn epochs(start: Epoch, end: Epoch, interval_s: f64) -> Vec<Epoch> {
    let mut ret = Vec::new();
    let mut t = start;
    while t <= end {
        ret.push(t);
        t = t + Duration::from_seconds(interval_s);
    }
    ret
}

/*
 * Formats an SP3 epoch descriptor, for whole second GPST epochs
 */
pub fn epoch_descriptor(t: Epoch) -> String {
    // "YYYY-MM-DDTHH:MM:SS GPST"
    let datetime = t.to_string();
    let fields = datetime[..19]
        .split(|c| c == '-' || c == 'T' || c == ':')
        .map(|field| field.parse::<u32>().unwrap())
        .collect::<Vec<_>>();
    format!(
        "*  {:04} {:>2} {:>2} {:>2} {:>2} {:>11.8}",
        fields[0], fields[1], fields[2], fields[3], fields[4], fields[5] as f64,
    )
}

/*
 * Synthetic SP3 content: one epoch per sample,
 * clock offsets given in seconds
 */
pub fn sp3_content(samples: &[(Epoch, Vec<(SV, f64)>)]) -> String {
    let mut content = String::new();
    content.push_str("#dP2024 12 15  0  0  0.00000000     289 ORBIT IGS20 HLM  IGS\n");
    content.push_str("## 2345      0.00000000   300.00000000 60659 0.0000000000000\n");
    content.push_str("%c G  cc GPS ccc cccc cccc cccc cccc ccccc ccccc ccccc ccccc\n");
    content.push_str("/* synthetic clock data\n");
    for (t, records) in samples.iter() {
        content.push_str(&epoch_descriptor(*t));
        content.push('\n');
        for (sv, offset_s) in records.iter() {
            content.push_str(&format!(
                "P{} -22335.782004 -14656.280389  -1218.238499 {:>14.6}\n",
                sv,
                offset_s * 1.0E6
            ));
        }
    }
    content.push_str("EOF\n");
    content
}

pub fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    let mut fd = File::create(&path).unwrap();
    fd.write_all(content.as_bytes()).unwrap();
    path
}

/*
 * Writes a single satellite SP3 file
 */
pub fn write_sp3<F: Fn(Epoch) -> f64>(
    dir: &Path,
    name: &str,
    sv: SV,
    epochs: &[Epoch],
    offset: F,
) -> PathBuf {
    let samples = epochs
        .iter()
        .map(|t| (*t, vec![(sv, offset(*t))]))
        .collect::<Vec<_>>();
    write_file(dir, name, &sp3_content(&samples))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::parsing::parse_epoch;

    #[test]
    fn descriptor_formatting() {
        let t = midnight(2024, 12, 15) + Duration::from_seconds(3.0 * 3600.0 + 5.0 * 60.0 + 30.0);
        let descriptor = epoch_descriptor(t);
        assert_eq!(descriptor, "*  2024 12 15  3  5 30.00000000");
        assert_eq!(parse_epoch(&descriptor).unwrap(), t);
    }
}
