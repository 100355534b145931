use nms_core::hash::{ALPHABET_LEN, CODE_LEN, hash, is_code};

#[test]
fn matches_published_mapping_codes() {
    assert_eq!(hash("Version"), "F2P");
    assert_eq!(hash("PlayerStateData"), "6f=");
    assert_eq!(hash("Platform"), "8>q");
    assert_eq!(hash("ActiveContext"), "XTp");
    assert_eq!(hash("CommonStateData"), "<h0");
    assert_eq!(hash("UniverseAddress"), "yhJ");
}

#[test]
fn covers_every_short_input_tail_length() {
    assert_eq!(hash("a"), "Gg6");
    assert_eq!(hash("Seed"), "@EL");
    assert_eq!(hash("Units"), "wGS");
    assert_eq!(hash("Timestamp"), "b1:");
    assert_eq!(hash("TimeStamps"), "h8@");
    assert_eq!(hash("TotalPlayTime"), "Lg8");
    assert_eq!(hash("ExpeditionContext"), "2YS");
}

#[test]
fn is_deterministic() {
    for name in ["Version", "", "LongFieldName".repeat(40).as_str(), "ÜnïcödeNäme"] {
        assert_eq!(hash(name), hash(name));
    }
}

#[test]
fn output_is_three_alphabet_characters() {
    let alphabet: Vec<char> = ('0'..='Z').chain('a'..='y').collect();
    assert_eq!(alphabet.len() as u64, ALPHABET_LEN);

    for i in 0..2000 {
        let code = hash(&format!("Field{i}"));
        assert_eq!(code.chars().count(), CODE_LEN, "{code}");
        assert!(code.chars().all(|c| alphabet.contains(&c)), "{code}");
        assert!(is_code(&code), "{code}");
    }
}

#[test]
fn is_code_rejects_other_shapes() {
    assert!(is_code("F2P"));
    assert!(!is_code("F2"));
    assert!(!is_code("F2PX"));
    assert!(!is_code("F_P"));
    assert!(!is_code("z00"));
}
