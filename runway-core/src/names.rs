//! Human readable execution names
//!
//! Used when a caller starts an execution without naming it.

use rand::Rng;
use rand::seq::SliceRandom;

const ADJECTIVES: &[&str] = &[
    "amber", "brave", "calm", "dapper", "eager", "fancy", "gentle", "happy", "icy", "jolly",
    "keen", "lucky", "mellow", "nimble", "odd", "proud", "quick", "rapid", "sunny", "tidy",
    "urban", "vivid", "witty", "young", "zesty",
];

const NOUNS: &[&str] = &[
    "badger", "comet", "dingo", "falcon", "gecko", "heron", "ibis", "jaguar", "koala", "lemur",
    "marten", "newt", "otter", "panda", "quail", "raven", "salmon", "tapir", "urchin", "viper",
    "walrus", "yak", "zebra",
];

/// Generates a short name like `brave-otter-4821`
pub fn random_name() -> String {
    let mut rng = rand::thread_rng();
    let adjective = ADJECTIVES.choose(&mut rng).copied().unwrap_or("quick");
    let noun = NOUNS.choose(&mut rng).copied().unwrap_or("otter");
    let suffix: u16 = rng.gen_range(1000..10000);
    format!("{adjective}-{noun}-{suffix}")
}
