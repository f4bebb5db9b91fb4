#![allow(dead_code)]

use warlord_sim::id::{CityId, FactionId, GeneralId};
use warlord_sim::model::World;
use warlord_sim::scenario::Scenario;

/// Shu holds one city bordering Wei's two-city line.
///
/// ```text
/// Hanzhong (Shu) -- Shangyong (Wei) -- Xuchang (Wei)
/// ```
pub struct Frontier {
    pub world: World,
    pub shu: FactionId,
    pub wei: FactionId,
    pub hanzhong: CityId,
    pub shangyong: CityId,
    pub xuchang: CityId,
    pub guan_yu: GeneralId,
    pub zhang_fei: GeneralId,
    pub xu_huang: GeneralId,
}

pub fn frontier() -> Frontier {
    let mut s = Scenario::new();
    let shu = s.faction("Shu", "Liu Bei");
    let wei = s.faction("Wei", "Cao Cao");
    let hanzhong = s.city("Hanzhong", shu.faction).food(4000).gold(1500).id();
    let shangyong = s.city("Shangyong", wei.faction).food(3000).gold(800).id();
    let xuchang = s.city("Xuchang", wei.faction).food(3000).gold(1200).id();
    s.link(hanzhong, shangyong);
    s.link(shangyong, xuchang);

    s.general_mut(shu.ruler).army(700).station(hanzhong);
    let guan_yu = s
        .general("Guan Yu")
        .serve(shu.faction)
        .stats(95, 97, 75, 62)
        .loyalty(1.0)
        .army(1000)
        .station(hanzhong)
        .id();
    let zhang_fei = s
        .general("Zhang Fei")
        .serve(shu.faction)
        .stats(85, 98, 30, 22)
        .loyalty(1.0)
        .army(950)
        .station(hanzhong)
        .id();
    s.general_mut(wei.ruler).army(1000).station(xuchang);
    let xu_huang = s
        .general("Xu Huang")
        .serve(wei.faction)
        .stats(88, 90, 74, 48)
        .loyalty(0.85)
        .army(600)
        .station(shangyong)
        .id();

    Frontier {
        world: s.build(),
        shu: shu.faction,
        wei: wei.faction,
        hanzhong,
        shangyong,
        xuchang,
        guan_yu,
        zhang_fei,
        xu_huang,
    }
}
