use proptest::prelude::*;

use txkit_script::chunk::decode_script;
use txkit_script::{build_multisig_redeemscript, parse_script, ParsedScript, Script, ScriptType};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn pushes_decode_to_what_was_pushed(parts in prop::collection::vec(prop::collection::vec(any::<u8>(), 1..600), 0..6)) {
        let mut script = Script::new();
        for part in &parts {
            script.append_push_data(part).unwrap();
        }
        let chunks = decode_script(script.to_bytes()).unwrap();
        let decoded: Vec<Vec<u8>> = chunks.iter().map(|c| c.push_data().unwrap().to_vec()).collect();
        prop_assert_eq!(decoded, parts);
    }

    #[test]
    fn script_hex_roundtrip(data in prop::collection::vec(any::<u8>(), 0..256)) {
        let script = Script::from_bytes(&data);
        let script2 = Script::from_hex(&script.to_hex()).unwrap();
        prop_assert_eq!(script.to_bytes(), script2.to_bytes());
    }

    #[test]
    fn classification_never_panics(data in prop::collection::vec(any::<u8>(), 0..128)) {
        // Display rendering must cope with anything classification sees.
        let _ = Script::from_bytes(&data).to_display_string();
        if let Ok(parsed) = parse_script(&data) {
            if parsed != ParsedScript::Unknown {
                prop_assert_eq!(parsed.to_script().unwrap().parse().unwrap().script_type(), parsed.script_type());
            }
        }
    }

    #[test]
    fn redeemscript_parses_back(
        key_bytes in prop::collection::vec(prop::array::uniform32(any::<u8>()), 1..=16),
        m_seed in any::<usize>(),
    ) {
        let keys: Vec<Vec<u8>> = key_bytes
            .iter()
            .map(|x| {
                let mut key = vec![0x02];
                key.extend_from_slice(x);
                key
            })
            .collect();
        let m = m_seed % keys.len() + 1;
        let script = build_multisig_redeemscript(&keys, m, false).unwrap();
        let parsed = parse_script(script.to_bytes()).unwrap();
        prop_assert_eq!(parsed.script_type(), ScriptType::Multisig);
        prop_assert_eq!(parsed.sigs_required(), m);
        prop_assert_eq!(parsed.keys(), &keys[..]);
    }
}
