//! Compiled-in site configuration: which pages are searched and how they rank.

use crate::model::PageDescriptor;

/// Only the main rules and equipment pages are searched; class pages are left out.
pub const PAGES: &[PageDescriptor] = &[
    PageDescriptor { title: "Main Page", url: "index.html" },
    PageDescriptor { title: "Stats & Skills", url: "skills.html" },
    PageDescriptor { title: "Advancement", url: "advencement.html" },
    PageDescriptor { title: "Perks", url: "perks.html" },
    PageDescriptor { title: "Magic", url: "magic.html" },
    PageDescriptor { title: "Basics", url: "basics.html" },
    PageDescriptor { title: "Adventuring", url: "adventuring.html" },
    PageDescriptor { title: "Encounters", url: "encounters.html" },
    PageDescriptor { title: "Exploration", url: "exploration.html" },
    PageDescriptor { title: "Downtime", url: "downtime.html" },
    PageDescriptor { title: "Armory", url: "armory.html" },
    PageDescriptor { title: "Crafting", url: "crafting.html" },
    PageDescriptor { title: "Expedition", url: "expidition.html" },
    PageDescriptor { title: "Knowledge", url: "knowledge.html" },
    PageDescriptor { title: "Gear", url: "gear.html" },
];

/// Rank used for pages missing from `PAGE_PRIORITY`.
pub const DEFAULT_PRIORITY: u32 = 4;

/// Page rank for cross-page ordering, 0 first. The file names match what the site serves.
pub const PAGE_PRIORITY: &[(&str, u32)] = &[
    ("basics.html", 0),
    ("skills.html", 1),
    ("adventuring.html", 2),
    ("encounters.html", 2),
    ("exploration.html", 2),
    ("downtime.html", 2),
    ("magic.html", 3),
    ("advencement.html", 3),
    ("armory.html", 4),
    ("crafting.html", 4),
    ("expidition.html", 4),
    ("perks.html", 4),
    ("index.html", 10),
];

/// Url → rank lookup with the default applied.
#[derive(Debug, Clone, Copy)]
pub struct PagePriority {
    table: &'static [(&'static str, u32)],
    default: u32,
}

impl Default for PagePriority {
    fn default() -> Self {
        Self::new(PAGE_PRIORITY, DEFAULT_PRIORITY)
    }
}

impl PagePriority {
    pub const fn new(table: &'static [(&'static str, u32)], default: u32) -> Self {
        Self { table, default }
    }

    /// Rank of a page; any `#fragment` on the URL is ignored.
    pub fn rank(&self, url: &str) -> u32 {
        let base = url.split('#').next().unwrap_or(url);
        self.table
            .iter()
            .find(|(page, _)| *page == base)
            .map(|(_, rank)| *rank)
            .unwrap_or(self.default)
    }
}
