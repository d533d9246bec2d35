use crmnote_core::{group_notes, group_notes_with, identifiers, Closure, Note, NoteDraft};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

const HOUR_MS: i64 = 60 * 60 * 1000;

#[derive(Default)]
struct Contact<'a> {
    first: Option<&'a str>,
    last: Option<&'a str>,
    email: Option<&'a str>,
    tel: Option<&'a str>,
}

fn note(contact: Contact<'_>, created_at: i64) -> Note {
    Note::with_id(
        Uuid::new_v4(),
        NoteDraft {
            first_name: contact.first.map(str::to_string),
            last_name: contact.last.map(str::to_string),
            email: contact.email.map(str::to_string),
            telephone: contact.tel.map(str::to_string),
            note_text: "contact request".to_string(),
            ..NoteDraft::default()
        },
        created_at,
    )
}

fn ids(groups: &[Vec<Note>]) -> Vec<Vec<Uuid>> {
    groups
        .iter()
        .map(|group| group.iter().map(|note| note.id).collect())
        .collect()
}

/// Deterministic pseudo-random contacts drawn from small value pools so
/// collisions are frequent.
fn generated_notes(count: usize, mut seed: u64) -> Vec<Note> {
    let emails = ["a@x.org", "A@X.org ", "b@x.org", "c@x.org", ""];
    let tels = ["111", " 222", "333", "", "   "];
    let names = [("Ada", "Byron"), ("ada ", "BYRON"), ("Max", "Mustermann"), ("", "Solo")];

    let mut next = move |bound: usize| {
        seed = seed
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        ((seed >> 33) as usize) % bound
    };

    (0..count)
        .map(|idx| {
            let email = emails[next(emails.len())];
            let tel = tels[next(tels.len())];
            let (first, last) = names[next(names.len())];
            let contact = Contact {
                first: (next(3) > 0).then_some(first),
                last: (next(3) > 0).then_some(last),
                email: (next(2) == 0).then_some(email),
                tel: (next(3) == 0).then_some(tel),
            };
            note(contact, (next(10) as i64) * HOUR_MS + idx as i64)
        })
        .collect()
}

#[test]
fn empty_input_returns_no_groups() {
    assert!(group_notes(&[]).is_empty());
}

#[test]
fn concrete_scenario_groups_by_case_insensitive_email() {
    let a = note(
        Contact {
            email: Some("x@y.com"),
            ..Contact::default()
        },
        9 * HOUR_MS,
    );
    let b = note(
        Contact {
            email: Some("X@Y.com"),
            ..Contact::default()
        },
        10 * HOUR_MS,
    );
    let c = note(
        Contact {
            tel: Some("123"),
            ..Contact::default()
        },
        8 * HOUR_MS,
    );

    let groups = group_notes(&[a.clone(), b.clone(), c.clone()]);
    assert_eq!(ids(&groups), vec![vec![b.id, a.id], vec![c.id]]);
}

#[test]
fn email_match_ignores_case_and_surrounding_whitespace() {
    let first = note(
        Contact {
            email: Some("A@B.com "),
            ..Contact::default()
        },
        1,
    );
    let second = note(
        Contact {
            email: Some("a@b.com"),
            ..Contact::default()
        },
        2,
    );

    let groups = group_notes(&[first, second]);
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].len(), 2);
}

#[test]
fn notes_without_identifiers_never_merge() {
    let blank_one = note(Contact::default(), 1);
    let blank_two = note(
        Contact {
            email: Some("  "),
            tel: Some(""),
            first: Some("Only"),
            ..Contact::default()
        },
        2,
    );

    let groups = group_notes(&[blank_one.clone(), blank_two.clone()]);
    assert_eq!(ids(&groups), vec![vec![blank_one.id], vec![blank_two.id]]);
}

#[test]
fn telephone_match_is_case_sensitive() {
    let upper = note(
        Contact {
            tel: Some("0800-CALL"),
            ..Contact::default()
        },
        1,
    );
    let lower = note(
        Contact {
            tel: Some("0800-call"),
            ..Contact::default()
        },
        2,
    );

    assert_eq!(group_notes(&[upper, lower]).len(), 2);
}

#[test]
fn cross_field_links_are_transitive() {
    let x = note(
        Contact {
            tel: Some("030 1234"),
            ..Contact::default()
        },
        1,
    );
    let y = note(
        Contact {
            tel: Some(" 030 1234"),
            first: Some("Ada"),
            last: Some("Lovelace"),
            ..Contact::default()
        },
        3,
    );
    let z = note(
        Contact {
            first: Some("ADA"),
            last: Some("lovelace "),
            email: Some("ada@example.org"),
            ..Contact::default()
        },
        2,
    );

    for closure in [Closure::FixedPoint, Closure::SinglePass] {
        let groups = group_notes_with(&[x.clone(), y.clone(), z.clone()], closure);
        assert_eq!(ids(&groups), vec![vec![y.id, z.id, x.id]], "{closure:?}");
    }
}

#[test]
fn fixed_point_picks_up_notes_skipped_earlier_in_the_pass() {
    // `phone_only` is scanned before `bridge` contributes its telephone.
    let seed = note(
        Contact {
            email: Some("seed@example.org"),
            ..Contact::default()
        },
        1,
    );
    let phone_only = note(
        Contact {
            tel: Some("555"),
            ..Contact::default()
        },
        2,
    );
    let bridge = note(
        Contact {
            email: Some("SEED@example.org"),
            tel: Some("555"),
            ..Contact::default()
        },
        3,
    );
    let input = vec![seed.clone(), phone_only.clone(), bridge.clone()];

    let fixed = group_notes_with(&input, Closure::FixedPoint);
    assert_eq!(ids(&fixed), vec![vec![bridge.id, phone_only.id, seed.id]]);

    let single = group_notes_with(&input, Closure::SinglePass);
    assert_eq!(
        ids(&single),
        vec![vec![bridge.id, seed.id], vec![phone_only.id]]
    );
}

#[test]
fn groups_follow_seed_order_and_sort_newest_first() {
    let old_a = note(
        Contact {
            email: Some("a@x.org"),
            ..Contact::default()
        },
        1,
    );
    let lone = note(
        Contact {
            tel: Some("999"),
            ..Contact::default()
        },
        50,
    );
    let new_a = note(
        Contact {
            email: Some("a@x.org"),
            ..Contact::default()
        },
        100,
    );
    let mid_a = note(
        Contact {
            email: Some("a@x.org"),
            ..Contact::default()
        },
        10,
    );

    let groups = group_notes(&[old_a.clone(), lone.clone(), new_a.clone(), mid_a.clone()]);
    assert_eq!(
        ids(&groups),
        vec![vec![new_a.id, mid_a.id, old_a.id], vec![lone.id]]
    );
}

#[test]
fn output_is_a_partition_of_the_input() {
    for seed in 1..=20_u64 {
        let notes = generated_notes(60, seed);
        for closure in [Closure::FixedPoint, Closure::SinglePass] {
            let groups = group_notes_with(&notes, closure);
            let mut seen = HashSet::new();
            for group in &groups {
                assert!(!group.is_empty());
                for member in group {
                    assert!(seen.insert(member.id), "note grouped twice");
                }
                assert!(group
                    .windows(2)
                    .all(|pair| pair[0].created_at >= pair[1].created_at));
            }
            let expected: HashSet<Uuid> = notes.iter().map(|note| note.id).collect();
            assert_eq!(seen, expected);
        }
    }
}

#[test]
fn fixed_point_groups_share_no_identifier_across_groups() {
    for seed in 1..=20_u64 {
        let notes = generated_notes(60, seed);
        let groups = group_notes(&notes);
        let mut owner = HashMap::new();
        for (group_idx, group) in groups.iter().enumerate() {
            for member in group {
                for identifier in identifiers(member) {
                    let previous = owner.insert(identifier.to_string(), group_idx);
                    assert!(
                        previous.is_none() || previous == Some(group_idx),
                        "identifier {identifier} split across groups"
                    );
                }
            }
        }
    }
}

#[test]
fn regrouping_one_group_keeps_it_whole() {
    for seed in 1..=10_u64 {
        let notes = generated_notes(40, seed);
        for group in group_notes(&notes) {
            let regrouped = group_notes(&group);
            assert_eq!(regrouped.len(), 1);
            assert_eq!(ids(&regrouped)[0], ids(std::slice::from_ref(&group))[0]);
        }
    }
}

#[test]
fn input_is_left_untouched() {
    let notes = generated_notes(25, 7);
    let before = notes.clone();
    let _ = group_notes(&notes);
    assert_eq!(notes, before);
}
