use simple_video::core::curriculum::horizon_for;
use simple_video::CurriculumConfig;

#[test]
fn 호라이즌_단조_증가_테스트() {
    let curriculum = CurriculumConfig::default();
    for total in [1usize, 5, 8, 30, 60, 61, 120] {
        let mut previous = 0;
        for epoch in 0..400 {
            let horizon = curriculum.horizon_for(epoch, total);
            assert!(horizon >= previous, "total {} epoch {} 에서 감소", total, epoch);
            assert!(horizon >= 1 && horizon <= total);
            assert!(horizon >= total.min(8));
            previous = horizon;
        }
        assert_eq!(curriculum.horizon_for(10_000, total), total);
    }
}

#[test]
fn 호라이즌_결정성_테스트() {
    let curriculum = CurriculumConfig::default();
    for epoch in 0..300 {
        assert_eq!(curriculum.horizon_for(epoch, 60), horizon_for(epoch, 60));
        assert_eq!(horizon_for(epoch, 60), horizon_for(epoch, 60));
    }
}

#[test]
fn 기본_계단_값_테스트() {
    // 60 프레임, 10 구간, 구간당 20 에포크
    let expected = [(0, 8), (19, 8), (20, 12), (40, 18), (100, 36), (179, 54), (180, 60)];
    for (epoch, horizon) in expected {
        assert_eq!(horizon_for(epoch, 60), horizon, "epoch {}", epoch);
    }
}
