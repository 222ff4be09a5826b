//! Scenario tests against captured EMV and GlobalPlatform responses.

use bertlv::{Error, Tag, Tlv, TlvList};
use hex_literal::hex;

/// SELECT PPSE response: FCI template with the payment directory inside
/// the FCI proprietary template.
const PPSE: [u8; 37] =
    hex!("6F23840E325041592E5359532E4444463031A511BF0C0E610C4F07A0000000031010870101");

/// SELECT ADF response for a Visa application, PDOL present.
const VISA_FCI: [u8; 54] = hex!(
    "6F348407A0000000031010A5299F381B9F66049F02069F03069F1A0295055F2A02"
    "9A039C019F37049F4E14BF0C089F5A054007020702"
);

/// GET PROCESSING OPTIONS response, format 2, with an 0x81-form length
/// and a 128-byte signed dynamic application data element.
const GPO: [u8; 233] = hex!(
    "7781E6820220409404180103009F360202059F260852D7F6595EFD1E2A9F10201F"
    "4A0132A00000000010030273000000004000000000000000000000000000009F4B"
    "81800CFF360C146FE6B1F0033753CBF984B71251881FA4218AD58B41E823D82C72"
    "3FB31EE69CA5D4011E420B216B425AB16499C4F28E73B0C429C54975B67BCBA30E"
    "5458C5ADEA7578604C76343DDD18F62ED95B2160BB05EDD3A99465385DFD15F68E"
    "54B92C035D46D90B32F5D7EE8DB2834DA0827A21A69659A53469F8F783974C9F6C"
    "02008057131122334455667788D23072010000043299995F9F6E04238800009F27"
    "0180"
);

/// READ RECORD response: record template with track-2 related data.
const READ_RECORD: [u8; 57] = hex!(
    "70375F280207029F0702C0009F19060400100302735F3401009F241D5630303130"
    "303134363136323038343435323437383432393538323830"
);

/// SELECT response from a card manager listing every selectable
/// application, one 61 entry per application.
const GP_APP_LIST: [u8; 295] = hex!(
    "610A4F08A000000151000000610E4F0CA000000151535041534B4D5361104F0EA0"
    "000001515350414C43434D414D61104D0EA0000001515350414C43434D444D610F"
    "4F0DA0000001515350415333535344610C4F0AA9A8A7A6A5A4A3A2A1A0610C4F0A"
    "A9A8A7A6A5A4A3A2A1A1610E4F0CA00000000353504200014201610E4F0CA00000"
    "015153504341534400610B4F09A00000015141434C0061124F10A0000000770107"
    "821D0000FE0000020061124F10A00000022053454353455350524F543161124F10"
    "A00000022053454353544F524147453161124F10A0000002201503010300000041"
    "524143610C4F0AA0A1A2A3A4A5A6A7A8A9610C4F0AA0A1A2A3A4A5A6A7A8AA6112"
    "4F10A000000077020760110000FE0000FE00610B4F09A00000015143525300"
);

fn tag(packed: u16) -> Tag {
    Tag::from_packed(packed).unwrap()
}

#[test]
fn ppse_parses_and_round_trips() {
    let tlv = Tlv::parse(&PPSE, 0, PPSE.len()).unwrap();
    assert_eq!(tlv.to_vec().unwrap(), PPSE);

    let df_name = tlv.find(Some(&tag(0x84))).unwrap();
    assert_eq!(df_name.value().unwrap(), b"2PAY.SYS.DDF01".as_slice());

    let directory = tlv
        .find(Some(&tag(0xA5)))
        .and_then(|a5| a5.find(Some(&tag(0xBF0C))))
        .and_then(|bf0c| bf0c.find(Some(&tag(0x61))))
        .unwrap();
    let aid = directory.find(Some(&tag(0x4F))).unwrap();
    assert_eq!(aid.value().unwrap(), &hex!("A0000000031010"));
    let priority = directory.find(Some(&tag(0x87))).unwrap();
    assert_eq!(priority.value().unwrap(), &hex!("01"));
}

#[test]
fn visa_fci_exposes_the_pdol() {
    let tlv = Tlv::parse(&VISA_FCI, 0, VISA_FCI.len()).unwrap();
    assert_eq!(tlv.to_vec().unwrap(), VISA_FCI);

    let a5 = tlv.find(Some(&tag(0xA5))).unwrap();
    let pdol = a5.find(Some(&tag(0x9F38))).unwrap();
    assert_eq!(pdol.length().unwrap(), 27);
    // the PDOL asks for the TTQ first
    assert_eq!(&pdol.value().unwrap()[..3], &hex!("9F6604"));
}

#[test]
fn gpo_round_trips_with_long_form_lengths() {
    let tlv = Tlv::parse(&GPO, 0, GPO.len()).unwrap();
    // the 81-form container length and the 81-form 9F4B length both
    // re-encode at their original widths
    assert_eq!(tlv.to_vec().unwrap(), GPO);
    assert_eq!(tlv.length().unwrap(), 230);

    let sdad = tlv.find(Some(&tag(0x9F4B))).unwrap();
    assert_eq!(sdad.length().unwrap(), 128);
    assert_eq!(sdad.size().unwrap(), 2 + 2 + 128);

    let cryptogram = tlv.find(Some(&tag(0x9F26))).unwrap();
    assert_eq!(cryptogram.value().unwrap(), &hex!("52D7F6595EFD1E2A"));

    let cid = tlv.find(Some(&tag(0x9F27))).unwrap();
    assert_eq!(cid.value().unwrap(), &hex!("80"));
}

#[test]
fn read_record_children_in_order() {
    let tlv = Tlv::parse(&READ_RECORD, 0, READ_RECORD.len()).unwrap();
    assert_eq!(tlv.to_vec().unwrap(), READ_RECORD);

    let children = tlv.children().unwrap();
    let tags: Vec<u16> = children
        .iter()
        .map(|child| child.tag().unwrap().packed().unwrap())
        .collect();
    assert_eq!(tags, [0x5F28, 0x9F07, 0x9F19, 0x5F34, 0x9F24]);

    let country = tlv.find(Some(&tag(0x5F28))).unwrap();
    assert_eq!(country.value().unwrap(), &hex!("0702"));
}

#[test]
fn application_list_is_a_sequential_stream() {
    let list = TlvList::parse(&GP_APP_LIST, 0, GP_APP_LIST.len()).unwrap();
    assert_eq!(list.len(), 18);
    assert_eq!(list.data_length(), GP_APP_LIST.len());

    let first_aid = list
        .get(0)
        .and_then(|entry| entry.find(Some(&tag(0x4F))))
        .unwrap();
    assert_eq!(first_aid.value().unwrap(), &hex!("A000000151000000"));

    // one entry uses 4D instead of 4F for its identifier
    let odd_entry = list.get(3).unwrap();
    assert!(odd_entry.find(Some(&tag(0x4F))).is_none());
    assert_eq!(
        odd_entry.find(Some(&tag(0x4D))).unwrap().length().unwrap(),
        14
    );

    let mut out = vec![0u8; GP_APP_LIST.len()];
    assert_eq!(list.write_into(&mut out, 0).unwrap(), GP_APP_LIST.len());
    assert_eq!(out, GP_APP_LIST);
}

#[test]
fn find_next_walks_repeated_entries() {
    // wrap the application list in a synthetic container to search it
    let mut container = Tlv::constructed(0);
    let mut body = Vec::new();
    body.extend_from_slice(&GP_APP_LIST[..46]); // first three entries
    container
        .init_constructed(Tag::from_packed(0xE0).unwrap(), &body)
        .unwrap();

    let entry_tag = tag(0x61);
    let first = container.find(Some(&entry_tag)).unwrap();
    let second = container
        .find_next(Some(&entry_tag), first, 1)
        .unwrap()
        .unwrap();
    let third = container
        .find_next(Some(&entry_tag), second, 1)
        .unwrap()
        .unwrap();
    assert_eq!(third.length().unwrap(), 16);
    assert_eq!(
        container.find_next(Some(&entry_tag), third, 1).unwrap(),
        None
    );
    assert_eq!(container.find_next(Some(&entry_tag), first, 2).unwrap(), Some(third));
    assert_eq!(container.find_next(Some(&entry_tag), first, 3).unwrap(), None);
    assert_eq!(
        container.find_next(Some(&entry_tag), first, 0),
        Err(Error::InvalidParam)
    );
}

#[test]
fn describe_renders_the_tree() {
    let tlv = Tlv::parse(&PPSE, 0, PPSE.len()).unwrap();
    let text = tlv.to_string();
    assert!(text.contains("T=6F [Constructed,Application]"));
    assert!(text.contains("+-- T=84 [Primitive,Context]"));
    assert!(text.contains("V=325041592E5359532E4444463031"));
}
