//! The backend-to-visual-style taxonomy shared by all figures.
//!
//! A `StyleRegistry` is constructed once (usually via
//! `StyleRegistry::standard`) and then only ever passed by reference
//! into the renderers; there are no mutating methods. A chart that
//! needs a different look for the same backend uses a different
//! backend id (see the `rd_*` entries of the standard table).

use std::{collections::BTreeMap, fmt::Display, str::FromStr};

use kstring::KString;

/// Short identifier of a storage/transport configuration under test,
/// e.g. "sync_ncl".
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct BackendId(KString);

impl BackendId {
    pub fn new(s: &str) -> Self {
        Self(KString::from_ref(s))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<&str> for BackendId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl Display for BackendId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An sRGB color; parses the Tableau names (`tab:blue` etc.) and
/// `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

const TABLEAU: &[(&str, Rgb)] = &[
    ("tab:blue", Rgb::hex(0x1f77b4)),
    ("tab:orange", Rgb::hex(0xff7f0e)),
    ("tab:green", Rgb::hex(0x2ca02c)),
    ("tab:red", Rgb::hex(0xd62728)),
    ("tab:purple", Rgb::hex(0x9467bd)),
    ("tab:brown", Rgb::hex(0x8c564b)),
    ("tab:pink", Rgb::hex(0xe377c2)),
    ("tab:gray", Rgb::hex(0x7f7f7f)),
    ("tab:olive", Rgb::hex(0xbcbd22)),
    ("tab:cyan", Rgb::hex(0x17becf)),
];

impl Rgb {
    pub const BLACK: Rgb = Rgb::hex(0x000000);
    pub const WHITE: Rgb = Rgb::hex(0xffffff);

    pub const fn hex(v: u32) -> Self {
        Rgb {
            r: ((v >> 16) & 0xff) as u8,
            g: ((v >> 8) & 0xff) as u8,
            b: (v & 0xff) as u8,
        }
    }

    pub fn tableau(name: &str) -> Option<Self> {
        TABLEAU.iter().find(|(n, _)| *n == name).map(|(_, c)| *c)
    }

    /// The `i`-th color of the default color cycle.
    pub fn cycle(i: usize) -> Self {
        TABLEAU[i % TABLEAU.len()].1
    }
}

#[derive(thiserror::Error, Debug)]
#[error("invalid color {0:?}, expecting `tab:<name>` or `#rrggbb`")]
pub struct InvalidColorError(String);

impl FromStr for Rgb {
    type Err = InvalidColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(c) = Rgb::tableau(s) {
            return Ok(c);
        }
        if let Some(hex) = s.strip_prefix('#') {
            if hex.len() == 6 {
                if let Ok(v) = u32::from_str_radix(hex, 16) {
                    return Ok(Rgb::hex(v));
                }
            }
        }
        Err(InvalidColorError(s.into()))
    }
}

impl TryFrom<String> for Rgb {
    type Error = InvalidColorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Rgb> for String {
    fn from(c: Rgb) -> Self {
        if let Some((name, _)) = TABLEAU.iter().find(|(_, t)| *t == c) {
            (*name).into()
        } else {
            format!("#{:02x}{:02x}{:02x}", c.r, c.g, c.b)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Marker {
    Circle,
    TriangleUp,
    TriangleDown,
    Square,
    Star,
    /// Filled plus
    Plus,
    /// Filled x
    Cross,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineStyle {
    Solid,
    Dotted,
    Dashed,
    DashDot,
    /// 10 on, 3 off
    LongDash,
}

impl LineStyle {
    /// Dash length and gap in pixels for a line of `line_width`;
    /// `None` for solid lines. Dash-dot has no dot, plotters dashes
    /// have one length.
    pub fn dash(self, line_width: u32) -> Option<(u32, u32)> {
        let (on, off) = match self {
            LineStyle::Solid => return None,
            LineStyle::Dotted => (1.0, 1.65),
            LineStyle::Dashed => (3.7, 1.6),
            LineStyle::DashDot => (6.4, 4.2),
            LineStyle::LongDash => (10.0, 3.0),
        };
        let w = line_width.max(1) as f64;
        let px = |v: f64| (v * w).round().max(1.) as u32;
        Some((px(on), px(off)))
    }
}

/// A hatch pattern in the usual character notation: `/` and `\`
/// diagonals, `|` and `-` straight lines, `x` and `+` crossings, `.`
/// dots and `*` stars. Repeating a character increases the density.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Hatch(KString);

impl Default for Hatch {
    fn default() -> Self {
        Self(KString::from_static(""))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum HatchStroke {
    Forward,
    Back,
    Vertical,
    Horizontal,
    Dots,
    Stars,
}

impl Hatch {
    pub fn new(s: &str) -> Self {
        Self(KString::from_ref(s))
    }

    pub fn none() -> Self {
        Self::default()
    }

    /// The strokes to draw and their density (number of occurrences),
    /// sorted by stroke kind.
    pub fn strokes(&self) -> Vec<(HatchStroke, u32)> {
        let mut counts: BTreeMap<HatchStroke, u32> = BTreeMap::new();
        let mut add = |s: HatchStroke| *counts.entry(s).or_insert(0) += 1;
        for c in self.0.chars() {
            match c {
                '/' => add(HatchStroke::Forward),
                '\\' => add(HatchStroke::Back),
                '|' => add(HatchStroke::Vertical),
                '-' => add(HatchStroke::Horizontal),
                'x' | 'X' => {
                    add(HatchStroke::Forward);
                    add(HatchStroke::Back);
                }
                '+' => {
                    add(HatchStroke::Vertical);
                    add(HatchStroke::Horizontal);
                }
                '.' | 'o' | 'O' => add(HatchStroke::Dots),
                '*' => add(HatchStroke::Stars),
                // matplotlib ignores unknown hatch characters, too
                _ => (),
            }
        }
        counts.into_iter().collect()
    }
}

/// The registry entry for one backend.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BackendStyle {
    pub id: BackendId,
    /// Legend label in line charts
    pub display_name: KString,
    /// Tick label in bar charts (may contain a line break); falls
    /// back to `display_name`
    #[serde(default)]
    pub bar_label: Option<KString>,
    /// Legend label in raw size-sweep charts; falls back to
    /// `display_name`
    #[serde(default)]
    pub sweep_label: Option<KString>,
    pub color: Rgb,
    pub marker: Marker,
    #[serde(default)]
    pub hatch: Hatch,
    pub linestyle: LineStyle,
    /// 0: drawn on the primary axes. Other values are reserved for a
    /// secondary-axis rendering.
    #[serde(default)]
    pub group_side: u8,
}

impl BackendStyle {
    pub fn bar_label(&self) -> &str {
        self.bar_label.as_deref().unwrap_or(self.display_name.as_str())
    }

    pub fn sweep_label(&self) -> &str {
        self.sweep_label.as_deref().unwrap_or(self.display_name.as_str())
    }

    pub fn is_primary_side(&self) -> bool {
        self.group_side == 0
    }
}

/// Referencing a backend id that has no visual encoding: fatal for
/// the figure being generated.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("configuration error: backend id {id:?} is not in the style registry")]
pub struct UnknownBackendError {
    pub id: BackendId,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum StyleRegistryError {
    #[error("backend id {0:?} is defined more than once")]
    Duplicate(BackendId),
}

#[derive(Debug, Clone)]
pub struct StyleRegistry {
    entries: BTreeMap<BackendId, BackendStyle>,
}

impl StyleRegistry {
    pub fn from_entries(
        entries: impl IntoIterator<Item = BackendStyle>,
    ) -> Result<Self, StyleRegistryError> {
        let mut map = BTreeMap::new();
        for entry in entries {
            let id = entry.id.clone();
            if map.insert(id.clone(), entry).is_some() {
                return Err(StyleRegistryError::Duplicate(id));
            }
        }
        Ok(Self { entries: map })
    }

    pub fn lookup(&self, id: &BackendId) -> Result<&BackendStyle, UnknownBackendError> {
        self.entries
            .get(id)
            .ok_or_else(|| UnknownBackendError { id: id.clone() })
    }

    /// Resolve all `ids` up front, so that a figure fails before
    /// anything is drawn.
    pub fn lookup_all<'r, 'i>(
        &'r self,
        ids: impl IntoIterator<Item = &'i BackendId>,
    ) -> Result<Vec<&'r BackendStyle>, UnknownBackendError> {
        ids.into_iter().map(|id| self.lookup(id)).collect()
    }

    /// The fixed taxonomy used by all figures of the paper.
    pub fn standard() -> Self {
        Self::from_entries(standard_entries()).expect("standard table has unique ids")
    }
}

fn entry(
    id: &str,
    display_name: &str,
    color: &str,
    marker: Marker,
    hatch: &str,
    linestyle: LineStyle,
) -> BackendStyle {
    BackendStyle {
        id: id.into(),
        display_name: KString::from_ref(display_name),
        bar_label: None,
        sweep_label: None,
        color: Rgb::tableau(color).expect("known tableau color name"),
        marker,
        hatch: Hatch::new(hatch),
        linestyle,
        group_side: 0,
    }
}

fn standard_entries() -> Vec<BackendStyle> {
    use LineStyle::*;
    use Marker::*;

    let with_labels = |mut e: BackendStyle, bar: Option<&str>, sweep: Option<&str>| {
        e.bar_label = bar.map(KString::from_ref);
        e.sweep_label = sweep.map(KString::from_ref);
        e
    };

    vec![
        with_labels(
            entry("cephfs", "weak-app DFT", "tab:orange", Circle, "//", Dotted),
            Some("weak-app \n DFT"),
            Some("weak-bench DFS"),
        ),
        entry(
            "cephfs_sync",
            "CephFS Direct I/O",
            "tab:green",
            TriangleUp,
            "",
            DashDot,
        ),
        entry("ext4", "ext4", "tab:red", Square, "*", Solid),
        with_labels(
            entry("ncl", "SplitFT", "tab:blue", Star, ".", Dashed),
            Some("NCL Weak"),
            None,
        ),
        with_labels(
            entry("sync", "strong-app DFT", "tab:purple", TriangleDown, "\\", Solid),
            Some("strong-app \n DFT"),
            Some("strong-bench DFS"),
        ),
        with_labels(
            entry("sync_ncl", "SplitFT", "tab:brown", Plus, "", Dashed),
            None,
            Some("NCL"),
        ),
        entry("nclwseq", "NCL w/ Seq", "tab:pink", Cross, "", Solid),
        // Raw read figure: same on-disk backends, distinct visual
        // treatment, hence distinct ids
        entry("rd_cephfs", "DFS", "tab:orange", Circle, "", Dotted),
        entry(
            "rd_sync_ncl",
            "NCL no prefetch",
            "tab:blue",
            Star,
            "",
            LongDash,
        ),
        entry("rd_ncl", "NCL", "tab:brown", Plus, "", Dashed),
        entry(
            "rd_cephfs_sync",
            "DFS direct IO",
            "tab:green",
            TriangleUp,
            "",
            DashDot,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn t_standard_lookup() {
        let reg = StyleRegistry::standard();
        let s = reg.lookup(&"sync_ncl".into()).unwrap();
        assert_eq!(s.display_name.as_str(), "SplitFT");
        assert_eq!(s.color, Rgb::hex(0x8c564b));
        assert_eq!(s.sweep_label(), "NCL");
        assert_eq!(s.bar_label(), "SplitFT");
        assert!(s.is_primary_side());
    }

    #[test]
    fn t_unknown_backend() {
        let reg = StyleRegistry::standard();
        let e = reg.lookup(&"zfs".into()).unwrap_err();
        assert_eq!(e.id.as_str(), "zfs");
        let ids: Vec<BackendId> = vec!["sync".into(), "zfs".into()];
        assert!(reg.lookup_all(&ids).is_err());
    }

    #[test]
    fn t_duplicate_rejected() {
        let a = entry("a", "A", "tab:blue", Marker::Circle, "", LineStyle::Solid);
        let res = StyleRegistry::from_entries(vec![a.clone(), a]);
        assert_eq!(
            res.unwrap_err(),
            StyleRegistryError::Duplicate(BackendId::new("a"))
        );
    }

    #[test]
    fn t_alternate_taxonomy() {
        let reg = StyleRegistry::from_entries(vec![entry(
            "only",
            "Only",
            "tab:cyan",
            Marker::Square,
            "xx",
            LineStyle::Dashed,
        )])
        .unwrap();
        assert_eq!(reg.lookup(&"only".into()).unwrap().display_name.as_str(), "Only");
        assert!(reg.lookup(&"sync".into()).is_err());
    }

    #[test]
    fn t_colors() {
        assert_eq!("tab:blue".parse::<Rgb>().unwrap(), Rgb::hex(0x1f77b4));
        assert_eq!("#010203".parse::<Rgb>().unwrap(), Rgb { r: 1, g: 2, b: 3 });
        assert!("blue".parse::<Rgb>().is_err());
        assert_eq!(String::from(Rgb::hex(0xff7f0e)), "tab:orange");
        assert_eq!(String::from(Rgb { r: 1, g: 2, b: 3 }), "#010203");
        assert_eq!(Rgb::cycle(0), Rgb::cycle(10));
        assert_eq!(Rgb::cycle(1), Rgb::hex(0xff7f0e));
    }

    #[test]
    fn t_hatch_strokes() {
        assert_eq!(Hatch::new("//").strokes(), [(HatchStroke::Forward, 2)]);
        assert_eq!(
            Hatch::new("xxx").strokes(),
            [(HatchStroke::Forward, 3), (HatchStroke::Back, 3)]
        );
        assert!(Hatch::new("").strokes().is_empty());
        assert_eq!(Hatch::new("\\\\\\").strokes(), [(HatchStroke::Back, 3)]);
    }

    #[test]
    fn t_dashes() {
        assert_eq!(LineStyle::Solid.dash(3), None);
        assert_eq!(LineStyle::LongDash.dash(3), Some((30, 9)));
        assert_eq!(LineStyle::Dotted.dash(1), Some((1, 2)));
        assert_eq!(LineStyle::Dashed.dash(0), LineStyle::Dashed.dash(1));
    }

    #[test]
    fn t_style_serde() {
        let reg = StyleRegistry::standard();
        let s = reg.lookup(&"cephfs".into()).unwrap();
        let yaml = serde_yml::to_string(s).unwrap();
        let back: BackendStyle = serde_yml::from_str(&yaml).unwrap();
        assert_eq!(&back, s);
    }
}
