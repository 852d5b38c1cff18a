//! The 26 canonical Renju openings.
//!
//! Offsets are `(dx, dy)` from the center with `dy` pointing up the board.
//! Direct openings have White's stone at `(0, 1)`, indirect ones at `(1, 1)`.

use serde::{Deserialize, Serialize};

/// Whether White's second stone is orthogonal or diagonal to the center.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpeningKind {
    Direct,
    Indirect,
}

impl OpeningKind {
    /// White's canonical offset for this kind.
    pub fn white_offset(self) -> (i32, i32) {
        match self {
            OpeningKind::Direct => (0, 1),
            OpeningKind::Indirect => (1, 1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Jushu {
    Kansei,
    Keigetsu,
    Sosei,
    Kagetsu,
    Zangetsu,
    Ugetsu,
    Kinsei,
    Shogetsu,
    Kyugetsu,
    Shingetsu,
    Zuisei,
    Sangetsu,
    Yusei,
    Chosei,
    Kyogetsu,
    Kosei,
    Suigetsu,
    Ryusei,
    Ungetsu,
    Hogetsu,
    Rangetsu,
    Gingetsu,
    Myojo,
    Shagetsu,
    Meigetsu,
    Suisei,
}

pub const JUSHU_COUNT: usize = 26;

/// `(jushu, kanji, black offset)` in table order.
const TABLE: [(Jushu, &str, (i32, i32)); JUSHU_COUNT] = [
    (Jushu::Kansei, "寒星", (0, 2)),
    (Jushu::Keigetsu, "溪月", (1, 2)),
    (Jushu::Sosei, "疎星", (2, 2)),
    (Jushu::Kagetsu, "花月", (1, 1)),
    (Jushu::Zangetsu, "残月", (2, 1)),
    (Jushu::Ugetsu, "雨月", (1, 0)),
    (Jushu::Kinsei, "金星", (2, 0)),
    (Jushu::Shogetsu, "松月", (0, -1)),
    (Jushu::Kyugetsu, "丘月", (1, -1)),
    (Jushu::Shingetsu, "新月", (2, -1)),
    (Jushu::Zuisei, "瑞星", (0, -2)),
    (Jushu::Sangetsu, "山月", (1, -2)),
    (Jushu::Yusei, "遊星", (2, -2)),
    (Jushu::Chosei, "長星", (2, 2)),
    (Jushu::Kyogetsu, "峡月", (1, 2)),
    (Jushu::Kosei, "恒星", (0, 2)),
    (Jushu::Suigetsu, "水月", (-1, 2)),
    (Jushu::Ryusei, "流星", (-2, 2)),
    (Jushu::Ungetsu, "雲月", (0, 1)),
    (Jushu::Hogetsu, "浦月", (-1, 1)),
    (Jushu::Rangetsu, "嵐月", (-2, 1)),
    (Jushu::Gingetsu, "銀月", (-1, 0)),
    (Jushu::Myojo, "明星", (-2, 0)),
    (Jushu::Shagetsu, "斜月", (-1, -1)),
    (Jushu::Meigetsu, "名月", (-2, -1)),
    (Jushu::Suisei, "彗星", (-2, -2)),
];

impl Jushu {
    pub const ALL: [Jushu; JUSHU_COUNT] = {
        let mut all = [Jushu::Kansei; JUSHU_COUNT];
        let mut i = 0;
        while i < JUSHU_COUNT {
            all[i] = TABLE[i].0;
            i += 1;
        }
        all
    };

    /// Position in the table, also the index into opening bonus weights.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn kind(self) -> OpeningKind {
        if self.index() < 13 {
            OpeningKind::Direct
        } else {
            OpeningKind::Indirect
        }
    }

    /// Romanised name.
    pub fn name(self) -> &'static str {
        match self {
            Jushu::Kansei => "Kansei",
            Jushu::Keigetsu => "Keigetsu",
            Jushu::Sosei => "Sosei",
            Jushu::Kagetsu => "Kagetsu",
            Jushu::Zangetsu => "Zangetsu",
            Jushu::Ugetsu => "Ugetsu",
            Jushu::Kinsei => "Kinsei",
            Jushu::Shogetsu => "Shogetsu",
            Jushu::Kyugetsu => "Kyugetsu",
            Jushu::Shingetsu => "Shingetsu",
            Jushu::Zuisei => "Zuisei",
            Jushu::Sangetsu => "Sangetsu",
            Jushu::Yusei => "Yusei",
            Jushu::Chosei => "Chosei",
            Jushu::Kyogetsu => "Kyogetsu",
            Jushu::Kosei => "Kosei",
            Jushu::Suigetsu => "Suigetsu",
            Jushu::Ryusei => "Ryusei",
            Jushu::Ungetsu => "Ungetsu",
            Jushu::Hogetsu => "Hogetsu",
            Jushu::Rangetsu => "Rangetsu",
            Jushu::Gingetsu => "Gingetsu",
            Jushu::Myojo => "Myojo",
            Jushu::Shagetsu => "Shagetsu",
            Jushu::Meigetsu => "Meigetsu",
            Jushu::Suisei => "Suisei",
        }
    }

    pub fn kanji(self) -> &'static str {
        TABLE[self.index()].1
    }

    /// Black's third stone relative to the center, canonical orientation.
    pub fn black_offset(self) -> (i32, i32) {
        TABLE[self.index()].2
    }

    /// Openings of one kind, in table order.
    pub fn of_kind(kind: OpeningKind) -> impl Iterator<Item = Jushu> {
        Jushu::ALL.into_iter().filter(move |j| j.kind() == kind)
    }
}

impl std::fmt::Display for Jushu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name(), self.kanji())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_order_matches_enum() {
        for (i, (j, _, _)) in TABLE.iter().enumerate() {
            assert_eq!(j.index(), i, "{} out of order", j.name());
            assert_eq!(Jushu::ALL[i], *j);
        }
    }

    #[test]
    fn test_thirteen_of_each_kind() {
        assert_eq!(Jushu::of_kind(OpeningKind::Direct).count(), 13);
        assert_eq!(Jushu::of_kind(OpeningKind::Indirect).count(), 13);
    }

    #[test]
    fn test_offsets_are_distinct_and_free() {
        for kind in [OpeningKind::Direct, OpeningKind::Indirect] {
            let offs: Vec<_> = Jushu::of_kind(kind).map(|j| j.black_offset()).collect();
            for (i, a) in offs.iter().enumerate() {
                assert_ne!(*a, (0, 0));
                assert_ne!(*a, kind.white_offset());
                assert!(a.0.abs() <= 2 && a.1.abs() <= 2);
                assert!(!offs[i + 1..].contains(a));
            }
        }
    }

    #[test]
    fn test_kagetsu_display() {
        assert_eq!(Jushu::Kagetsu.to_string(), "Kagetsu (花月)");
        assert_eq!(Jushu::Kagetsu.kind(), OpeningKind::Direct);
        assert_eq!(Jushu::Hogetsu.kind(), OpeningKind::Indirect);
    }
}
