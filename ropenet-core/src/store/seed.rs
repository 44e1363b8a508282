/*
    seed.rs - Built-in data loaded at startup

    Two instances ship with the binary:
    - local.ropenet: the default, personal instance
    - cyber.alley: a public instance for sharing finds

    Seed ids are unique across every kind and both instances. The allocator
    starts above the highest of them.
*/

use super::partition::Partition;
use super::registry::Instance;
use crate::model::{
    Achievement, EntityId, Faction, MissionDetails, ParentRef, Plugin, Reply, Subtask, Thread,
    ThreadKind, Timestamp, User, UserStatus,
};
use crate::social;

pub const LOCAL_INSTANCE: &str = "local.ropenet";
pub const ALLEY_INSTANCE: &str = "cyber.alley";

const HOUR_MS: u64 = 3_600_000;

fn cypher(now: Timestamp) -> User {
    let mut user = User::new(EntityId(1), "Cypher", "cypher@ropenet.local");
    user.phone = Some("13800138001".to_string());
    user.avatar_url = "https://cdn.pixabay.com/photo/2023/04/23/12/37/cyborg-7945532_1280.png".to_string();
    user.reputation = 1500;
    user.status = UserStatus::Online;
    user.title = "Net Master".to_string();
    user.bio = "AI core researcher.".to_string();
    user.faction = Some(Faction::Development);
    user.badges = vec!["leader".to_string(), "coder".to_string()];
    user.is_admin = true;
    user.last_online = now;
    user.level = 15;
    user.experience = 15_000;
    user.equipped_achievement = Some("Pioneer".to_string());
    user
}

fn nomad(now: Timestamp) -> User {
    let mut user = User::new(EntityId(2), "Nomad", "nomad@ropenet.local");
    user.phone = Some("13800138002".to_string());
    user.avatar_url = "https://cdn.pixabay.com/photo/2023/06/15/09/20/cyberpunk-8064560_1280.jpg".to_string();
    user.reputation = 850;
    user.status = UserStatus::Away;
    user.title = "Drifting Hacker".to_string();
    user.bio = "A free soul riding the data stream.".to_string();
    user.faction = Some(Faction::Story);
    user.badges = vec!["writer".to_string()];
    user.last_online = now.minus_millis(HOUR_MS);
    user.level = 8;
    user.experience = 8_000;
    user.equipped_achievement = Some("Community Star".to_string());
    user
}

fn alley_cat(now: Timestamp) -> User {
    let mut user = User::new(EntityId(101), "AlleyCat", "cat@alley.net");
    user.avatar_url = "https://cdn.pixabay.com/photo/2017/02/20/18/03/cat-2083492_1280.jpg".to_string();
    user.reputation = 999;
    user.status = UserStatus::Online;
    user.title = "King of the Alley".to_string();
    user.bio = "A cat roaming the cyber alleys.".to_string();
    user.faction = Some(Faction::Freelancer);
    user.badges = vec!["explorer".to_string()];
    user.last_online = now;
    user.level = 10;
    user.experience = 10_000;
    user.equipped_achievement = Some("Alley Ranger".to_string());
    user
}

fn local_partition(now: Timestamp) -> Partition {
    let mut partition = Partition::new();
    partition.insert_user(cypher(now));
    partition.insert_user(nomad(now));
    social::seed_follow(&mut partition.users, EntityId(1), EntityId(2));

    partition.push_thread_front(Thread {
        id: EntityId(10),
        title: "Welcome to the local net!".to_string(),
        content: "This is the first post of the local instance.".to_string(),
        tags: vec!["announcement".to_string()],
        author_id: EntityId(1),
        timestamp: now.minus_millis(5_000_000),
        likes: 10,
        dislikes: 1,
        replies: Vec::new(),
        kind: ThreadKind::Post,
        is_completed: false,
        mission_details: None,
        reposts: 2,
        quotes: 0,
    });
    partition.push_thread_front(Thread {
        id: EntityId(20),
        title: "Mission: design a logo".to_string(),
        content: "We need a logo for the local net. Submit a sketch.".to_string(),
        tags: vec!["mission".to_string(), "art".to_string()],
        author_id: EntityId(1),
        timestamp: now.minus_millis(2_000_000),
        likes: 3,
        dislikes: 0,
        replies: Vec::new(),
        kind: ThreadKind::Mission,
        is_completed: false,
        mission_details: Some(MissionDetails {
            reward: 300,
            deadline: Timestamp::from_millis(now.as_millis() + 7 * 24 * HOUR_MS),
            assignee_id: None,
            submitted_solution: None,
            is_approved: false,
            subtasks: vec![
                Subtask { id: EntityId(21), description: "Draft three concepts".to_string(), completed: false },
                Subtask { id: EntityId(22), description: "Pick a palette".to_string(), completed: false },
            ],
        }),
        reposts: 0,
        quotes: 0,
    });

    // Seed ids are fixed and the parent exists, so attaching cannot fail.
    let _ = partition.attach_reply(Reply {
        id: EntityId(11),
        thread_id: EntityId(10),
        parent: ParentRef::Thread(EntityId(10)),
        content: "Local instance rocks!".to_string(),
        author_id: EntityId(2),
        timestamp: now.minus_millis(4_000_000),
        likes: 5,
        dislikes: 0,
        replies: Vec::new(),
    });
    partition
}

fn alley_partition(now: Timestamp) -> Partition {
    let mut partition = Partition::new();
    partition.insert_user(alley_cat(now));
    partition.push_thread_front(Thread {
        id: EntityId(201),
        title: "[Cyber Alley] Field notes".to_string(),
        content: "Found a hidden data node deep in the alley today...".to_string(),
        tags: vec!["explore".to_string()],
        author_id: EntityId(101),
        timestamp: now.minus_millis(1_000_000),
        likes: 25,
        dislikes: 0,
        replies: Vec::new(),
        kind: ThreadKind::Post,
        is_completed: false,
        mission_details: None,
        reposts: 5,
        quotes: 1,
    });
    partition
}

/// Both built-in instances with timestamps relative to `now`
pub fn default_instances(now: Timestamp) -> Vec<Instance> {
    vec![
        Instance::new(
            LOCAL_INSTANCE,
            "Local Net (default)",
            "Your personal local instance, kept in memory.",
            local_partition(now),
        ),
        Instance::new(
            ALLEY_INSTANCE,
            "Cyber Alley",
            "A public instance focused on exploring and sharing intel.",
            alley_partition(now),
        ),
    ]
}

pub fn default_plugins() -> Vec<Plugin> {
    vec![
        Plugin::new("weather", "Weather widget", "Shows the weather in the top-left corner", true),
        Plugin::new("countdown", "New year countdown", "Shows a countdown to the new year", false),
    ]
}

pub fn default_achievements() -> Vec<Achievement> {
    vec![
        Achievement {
            id: EntityId(501),
            name: "First Post".to_string(),
            description: "Publish your first thread".to_string(),
            reward: 100,
            image_url: String::new(),
        },
        Achievement {
            id: EntityId(502),
            name: "Community Star".to_string(),
            description: "Gain ten followers".to_string(),
            reward: 500,
            image_url: String::new(),
        },
        Achievement {
            id: EntityId(503),
            name: "Pioneer".to_string(),
            description: "Complete a mission".to_string(),
            reward: 1000,
            image_url: String::new(),
        },
    ]
}
