use serde::Serialize;

/// A party on the ballot. Reference data only: casting never checks it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Party {
    pub id: u32,
    pub name: &'static str,
    pub logo: &'static str,
}

pub const PARTIES: [Party; 5] = [
    Party {
        id: 1,
        name: "BJP",
        logo: "https://example.com/bjp-logo.png",
    },
    Party {
        id: 2,
        name: "Congress",
        logo: "https://example.com/congress-logo.png",
    },
    Party {
        id: 3,
        name: "Samajwadi Party",
        logo: "https://example.com/samajwadi-logo.png",
    },
    Party {
        id: 4,
        name: "Aam Aadmi Party",
        logo: "https://example.com/aap-logo.png",
    },
    Party {
        id: 5,
        name: "NOTA",
        logo: "https://via.placeholder.com/50?text=NOTA",
    },
];
